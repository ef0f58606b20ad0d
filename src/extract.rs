//! Peer address extraction from `transmission-remote -pi` output
//!
//! The peer table printed by the daemon looks like:
//!
//! ```text
//! Address                                  Flags         Done  Down    Up      Client
//! 203.0.113.125                            TEI           60.0   0.0     0.0    qBittorrent 4.6.2
//! ```
//!
//! Every line is scanned for the leftmost dotted-decimal IPv4 pattern. Lines
//! without one (headers, blank lines, IPv6 peers) are skipped. Octets are not
//! range checked here; `999.1.1.1` is extracted as-is and left to the
//! resolver to reject.

use regex::Regex;
use std::sync::OnceLock;

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").expect("valid IPv4 pattern"))
}

/// Extract the first IPv4-looking address from a single line
pub fn extract_address(line: &str) -> Option<&str> {
    ipv4_pattern().find(line).map(|m| m.as_str())
}

/// Extract one address per line, in input order
pub fn extract_addresses<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| extract_address(line.as_ref()).map(str::to_string))
        .collect()
}
