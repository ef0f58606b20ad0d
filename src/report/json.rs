use std::io::{self, Write};

use super::Reporter;
use crate::stats::SummaryView;

/// Writes each summary as a single JSON line, suitable for `jq` or log shippers
pub struct JsonReporter<W> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn render(&mut self, view: &SummaryView) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, view)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
