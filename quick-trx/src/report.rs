// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ReadError,
    read::{ResultsScope, read_test_run},
};
use chrono::{DateTime, FixedOffset};
use std::{io, time::Duration};

/// The root element of a TRX document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestRun {
    /// The `id` attribute of the run, if present.
    pub id: Option<String>,

    /// The `name` attribute of the run, if present.
    pub name: Option<String>,

    /// The unit test results, in document order.
    pub results: Vec<UnitTestResult>,
}

impl TestRun {
    /// Creates a new, empty `TestRun`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a `TestRun` from a string.
    ///
    /// `scope` controls which `UnitTestResult` elements are collected.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(document: &str, scope: ResultsScope) -> Result<Self, ReadError> {
        read_test_run(quick_xml::Reader::from_str(document), scope)
    }

    /// Reads a `TestRun` from a buffered reader.
    pub fn from_reader(reader: impl io::BufRead, scope: ResultsScope) -> Result<Self, ReadError> {
        read_test_run(quick_xml::Reader::from_reader(reader), scope)
    }

    /// Adds a result to this run.
    pub fn add_result(&mut self, result: UnitTestResult) -> &mut Self {
        self.results.push(result);
        self
    }
}

/// A single `UnitTestResult` element.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct UnitTestResult {
    /// The `testName` attribute.
    ///
    /// Test names are not guaranteed to be unique within a run.
    pub test_name: String,

    /// The raw `outcome` attribute, e.g. `Passed`, `Failed` or `NotExecuted`.
    pub outcome: String,

    /// The `testId` attribute.
    pub test_id: Option<String>,

    /// The `executionId` attribute.
    pub execution_id: Option<String>,

    /// The `computerName` attribute.
    pub computer_name: Option<String>,

    /// The `startTime` attribute.
    pub start_time: Option<DateTime<FixedOffset>>,

    /// The `endTime` attribute.
    pub end_time: Option<DateTime<FixedOffset>>,

    /// The `duration` attribute.
    pub duration: Option<Duration>,

    /// The `Output` child element, if present.
    pub output: Option<Output>,
}

impl UnitTestResult {
    /// Creates a new result with the given name and outcome.
    pub fn new(test_name: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            outcome: outcome.into(),
            test_id: None,
            execution_id: None,
            computer_name: None,
            start_time: None,
            end_time: None,
            duration: None,
            output: None,
        }
    }

    /// Sets the start time.
    pub fn set_start_time(&mut self, start_time: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.start_time = Some(start_time.into());
        self
    }

    /// Sets the end time.
    pub fn set_end_time(&mut self, end_time: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.end_time = Some(end_time.into());
        self
    }

    /// Sets the duration.
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the output element.
    pub fn set_output(&mut self, output: Output) -> &mut Self {
        self.output = Some(output);
        self
    }

    /// Returns the `ErrorInfo` element, if both it and `Output` are present.
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        self.output.as_ref()?.error_info.as_ref()
    }
}

/// The `Output` element of a result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    /// Text of the `StdOut` element.
    pub std_out: Option<String>,

    /// Text of the `StdErr` element.
    pub std_err: Option<String>,

    /// The `ErrorInfo` element.
    pub error_info: Option<ErrorInfo>,
}

impl Output {
    /// Creates a new, empty `Output`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error information.
    pub fn set_error_info(&mut self, error_info: ErrorInfo) -> &mut Self {
        self.error_info = Some(error_info);
        self
    }
}

/// The `ErrorInfo` element of an output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Text of the `Message` element.
    pub message: Option<String>,

    /// Text of the `StackTrace` element.
    pub stack_trace: Option<String>,
}

impl ErrorInfo {
    /// Creates a new `ErrorInfo`.
    pub fn new(message: Option<String>, stack_trace: Option<String>) -> Self {
        Self {
            message,
            stack_trace,
        }
    }
}
