// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeRecorder, RunSummary};
use crate::errors::RecordError;
use mstest_metadata::{OutcomeRecord, TestStatus};
use owo_colors::{OwoColorize, Style};
use std::{fmt, io::Write, time::Duration};

/// Writes human-readable outcome lines and a final summary.
#[derive(Debug)]
pub struct DisplayRecorder<W> {
    writer: W,
    styles: Styles,
}

impl<W: Write> DisplayRecorder<W> {
    /// Creates a new recorder writing to `writer`, without colors.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styles: Styles::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) -> &mut Self {
        self.styles.colorize();
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(
        &mut self,
        record: &OutcomeRecord,
        duration: Option<Duration>,
    ) -> std::io::Result<()> {
        let (label, style) = match record.status {
            TestStatus::Passed => ("PASS", self.styles.pass),
            TestStatus::Failed => ("FAIL", self.styles.fail),
            TestStatus::Inconclusive => ("INCONCLUSIVE", self.styles.skip),
        };
        write!(self.writer, "{:>12} ", label.style(style))?;
        match duration {
            Some(duration) => write!(self.writer, "{}", DisplayBracketedDuration(duration))?,
            None => write!(self.writer, "{:12}", "")?,
        }
        writeln!(self.writer, "{}", record.test_name.style(self.styles.test_name))?;

        if record.status != TestStatus::Passed && !record.detail.is_empty() {
            for line in record.detail.lines() {
                writeln!(self.writer, "{:>12} {line}", "")?;
            }
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> std::io::Result<()> {
        let summary_style = if summary.is_success() {
            self.styles.pass
        } else {
            self.styles.fail
        };
        writeln!(self.writer, "------------")?;
        write!(
            self.writer,
            "{:>12} {} {} run: ",
            "Summary".style(summary_style),
            summary.total().style(self.styles.count),
            plural_tests(summary.total()),
        )?;
        write!(
            self.writer,
            "{} {}, {} {}",
            summary.passed.style(self.styles.count),
            "passed".style(self.styles.pass),
            summary.failed.style(self.styles.count),
            "failed".style(self.styles.fail),
        )?;
        if summary.inconclusive > 0 {
            write!(
                self.writer,
                ", {} {}",
                summary.inconclusive.style(self.styles.count),
                "inconclusive".style(self.styles.skip),
            )?;
        }
        writeln!(self.writer)
    }
}

impl<W: Write> OutcomeRecorder for DisplayRecorder<W> {
    fn record(
        &mut self,
        record: &OutcomeRecord,
        duration: Option<Duration>,
    ) -> Result<(), RecordError> {
        self.write_record(record, duration).map_err(RecordError::Io)
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), RecordError> {
        self.write_summary(summary)
            .and_then(|()| self.writer.flush())
            .map_err(RecordError::Io)
    }
}

fn plural_tests(count: usize) -> &'static str {
    if count == 1 { "test" } else { "tests" }
}

struct DisplayBracketedDuration(Duration);

impl fmt::Display for DisplayBracketedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // * > means right-align.
        // * 8 is the number of characters to pad to.
        // * .3 means print three digits after the decimal point.
        write!(f, "[{:>8.3?}s] ", self.0.as_secs_f64())
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    skip: Style,
    test_name: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.test_name = Style::new().blue().bold();
    }
}
