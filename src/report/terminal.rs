use std::io::{self, IsTerminal, Write};

use super::Reporter;
use crate::stats::SummaryView;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// ANSI palette, empty strings when colour is disabled
#[derive(Debug, Clone, Copy)]
struct Palette {
    reset: &'static str,
    bold: &'static str,
    cyan: &'static str,
    green: &'static str,
    magenta: &'static str,
    orange: &'static str,
    light_blue: &'static str,
    light_green: &'static str,
}

impl Palette {
    const COLOR: Palette = Palette {
        reset: "\x1b[0m",
        bold: "\x1b[1m",
        cyan: "\x1b[36m",
        green: "\x1b[32m",
        magenta: "\x1b[35m",
        orange: "\x1b[38;5;208m",
        light_blue: "\x1b[38;5;153m",
        light_green: "\x1b[38;5;120m",
    };

    const PLAIN: Palette = Palette {
        reset: "",
        bold: "",
        cyan: "",
        green: "",
        magenta: "",
        orange: "",
        light_blue: "",
        light_green: "",
    };
}

pub struct TerminalReporter<W> {
    out: W,
    palette: Palette,
    clear_screen: bool,
}

impl TerminalReporter<io::Stdout> {
    /// Colour and screen clearing only apply when stdout is a TTY
    pub fn stdout(clear_screen: bool) -> Self {
        let tty = io::stdout().is_terminal();
        Self::new(io::stdout(), tty).with_clear_screen(clear_screen && tty)
    }
}

impl<W: Write> TerminalReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            palette: if color { Palette::COLOR } else { Palette::PLAIN },
            clear_screen: false,
        }
    }

    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TerminalReporter<W> {
    fn render(&mut self, view: &SummaryView) -> io::Result<()> {
        let Palette {
            reset,
            bold,
            cyan,
            green,
            magenta,
            orange,
            light_blue,
            light_green,
        } = self.palette;
        let out = &mut self.out;

        if self.clear_screen {
            write!(out, "{}", CLEAR_SCREEN)?;
        }

        writeln!(out, "{bold}{cyan}=== Peer statistics ==={reset}")?;
        if let Some(last_sample) = view.last_sample {
            writeln!(
                out,
                "{green}Last sample: {reset}{} (round {})",
                last_sample.format("%Y-%m-%d %H:%M:%S"),
                view.rounds
            )?;
        }
        writeln!(
            out,
            "{green}Total peer sightings (connections): {reset}{}",
            view.total_connections
        )?;
        writeln!(
            out,
            "{green}Unique addresses seen: {reset}{}",
            view.unique_addresses
        )?;

        writeln!(out, "\n{bold}{orange}Connections by country:{reset}")?;
        for country in &view.countries {
            writeln!(
                out,
                " {magenta}- {}: {}{reset}",
                country.country, country.connections
            )?;
        }

        if !view.top_peers.is_empty() {
            writeln!(out, "\n{bold}{orange}Most seen peers:{reset}")?;
            for peer in &view.top_peers {
                writeln!(
                    out,
                    " {magenta}- {} ({}): {}, last seen {}{reset}",
                    peer.address,
                    peer.country,
                    peer.sightings,
                    peer.last_seen.format("%H:%M:%S")
                )?;
            }
        }

        writeln!(
            out,
            "\n{bold}{light_blue}Connections by hour of day (0-23):{reset}"
        )?;
        for hour in &view.hours {
            writeln!(
                out,
                " {light_green}- {:02}: {}{reset}",
                hour.hour, hour.connections
            )?;
        }

        writeln!(out, "{bold}{cyan}=== End of summary ==={reset}\n")?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::NullResolver;
    use crate::stats::AggregationStore;
    use chrono::{Local, TimeZone};

    fn sample_view() -> SummaryView {
        let mut store = AggregationStore::new(NullResolver);
        let now = Local
            .with_ymd_and_hms(2024, 3, 1, 14, 0, 0)
            .earliest()
            .unwrap();
        store.observe(&["203.0.113.10", "203.0.113.10", "198.51.100.7"], now);
        store.summarize()
    }

    fn render_plain(view: &SummaryView) -> String {
        let mut reporter = TerminalReporter::new(Vec::new(), false);
        reporter.render(view).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_report_contents() {
        let text = render_plain(&sample_view());

        assert!(text.contains("Total peer sightings (connections): 3"));
        assert!(text.contains("Unique addresses seen: 2"));
        assert!(text.contains(" - Unknown: 3"));
        assert!(text.contains(" - 14: 3"));
        assert!(text.contains(" - 00: 0"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_hour_table_has_24_rows() {
        let text = render_plain(&sample_view());
        let rows = text
            .lines()
            .filter(|line| line.starts_with(" - "))
            .filter(|line| line.get(3..5).is_some_and(|h| h.chars().all(|c| c.is_ascii_digit())))
            .count();

        assert_eq!(rows, 24);
    }

    #[test]
    fn test_colored_report_clears_screen() {
        let mut reporter = TerminalReporter::new(Vec::new(), true).with_clear_screen(true);
        reporter.render(&sample_view()).unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();

        assert!(text.starts_with(CLEAR_SCREEN));
        assert!(text.contains("\x1b[1m"));
    }
}
