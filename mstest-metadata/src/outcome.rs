// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset};
use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The verdict of a single test case.
///
/// Inconclusive is a terminal state of its own: it neither passes nor fails a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    /// The test passed.
    Passed,

    /// The test failed, errored, timed out or was aborted.
    Failed,

    /// The test did not execute.
    Inconclusive,
}

impl TestStatus {
    /// Returns the status code recorded for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Inconclusive => "Inconclusive",
        }
    }

    /// Returns true if this status fails a run.
    pub fn is_failure(self) -> bool {
        matches!(self, TestStatus::Failed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of UUID that identifies a single invocation of a test runner.
pub enum RunKind {}

impl TypedUuidKind for RunKind {
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("mstest_run");
        TAG
    }
}

/// A unique identifier for a single invocation of a test runner.
pub type RunUuid = TypedUuid<RunKind>;

/// One reported test outcome.
///
/// This is the record handed to downstream persistence: it combines the
/// normalized outcome of one `UnitTestResult` with the group label and run
/// identifier of the invocation that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutcomeRecord {
    /// The test name. Not guaranteed to be unique within a run.
    pub test_name: String,

    /// The normalized status.
    pub status: TestStatus,

    /// `Passed` for passing tests; otherwise the failure message and stack
    /// trace, or `Ignored` for tests skipped without diagnostic output.
    pub detail: String,

    /// When the test started.
    pub start_time: DateTime<FixedOffset>,

    /// When the test ended. Never earlier than `start_time`.
    pub end_time: DateTime<FixedOffset>,

    /// The operator-supplied group label.
    pub group: String,

    /// The invocation that produced this outcome.
    pub run_id: RunUuid,
}

impl OutcomeRecord {
    /// Serializes this record as a single line of JSON, without a trailing newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a record from a line of JSON.
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
