/// CLI utilities for consistent output formatting
use std::io::IsTerminal;

/// Get a colored prefix
///
/// Returns bright cyan if stderr is a TTY, plain text otherwise.
pub fn peerwatch_prefix() -> &'static str {
    if std::io::stderr().is_terminal() {
        "\x1b[96m[peerwatch]\x1b[0m"
    } else {
        "[peerwatch]"
    }
}

/// Check mark or cross for doctor-style output
pub fn status_mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}
