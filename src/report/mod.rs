pub mod json;
pub mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;

use crate::stats::SummaryView;

/// Renders a summary somewhere a human (or a pipe) can read it
pub trait Reporter {
    fn render(&mut self, view: &SummaryView) -> io::Result<()>;
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn render(&mut self, view: &SummaryView) -> io::Result<()> {
        (**self).render(view)
    }
}

/// Output format for the watch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Full-screen summary, coloured on a TTY
    #[default]
    Terminal,
    /// One JSON document per line
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" | "text" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unknown report format '{}' (expected terminal or json)",
                other
            )),
        }
    }
}

/// Build the reporter for `format`, writing to stdout
pub fn stdout_reporter(format: ReportFormat, clear_screen: bool) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Terminal => Box::new(TerminalReporter::stdout(clear_screen)),
        ReportFormat::Json => Box::new(JsonReporter::new(io::stdout())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_format() {
        assert_eq!("terminal".parse::<ReportFormat>(), Ok(ReportFormat::Terminal));
        assert_eq!("TEXT".parse::<ReportFormat>(), Ok(ReportFormat::Terminal));
        assert_eq!("json".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert!("yaml".parse::<ReportFormat>().is_err());
    }
}
