// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeRecorder, RunSummary};
use crate::errors::RecordError;
use mstest_metadata::OutcomeRecord;
use std::{io::Write, time::Duration};

/// Writes each record as one line of JSON.
///
/// The output can be read back with [`OutcomeRecord::from_json_line`].
#[derive(Debug)]
pub struct JsonRecorder<W> {
    writer: W,
}

impl<W: Write> JsonRecorder<W> {
    /// Creates a new recorder writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutcomeRecorder for JsonRecorder<W> {
    fn record(
        &mut self,
        record: &OutcomeRecord,
        _duration: Option<Duration>,
    ) -> Result<(), RecordError> {
        let line = record.to_json_line().map_err(RecordError::Json)?;
        writeln!(self.writer, "{line}").map_err(RecordError::Io)
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<(), RecordError> {
        self.writer.flush().map_err(RecordError::Io)
    }
}
