// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reports normalized outcomes.
//!
//! The main entry point in this module is [`report_outcomes`], which turns each
//! [`TestOutcome`] into an [`OutcomeRecord`] and hands it to every [`OutcomeRecorder`].

mod displayer;
mod json;
mod junit;

pub use displayer::*;
pub use json::*;
pub use junit::*;

use crate::{errors::RecordError, outcome::TestOutcome};
use mstest_metadata::{OutcomeRecord, RunUuid, TestStatus};
use std::time::Duration;

/// Receives reported outcomes.
pub trait OutcomeRecorder {
    /// Records a single outcome. `duration` is the duration reported by the runner, if any.
    fn record(&mut self, record: &OutcomeRecord, duration: Option<Duration>)
    -> Result<(), RecordError>;

    /// Called once after the last outcome has been recorded.
    fn finish(&mut self, summary: &RunSummary) -> Result<(), RecordError>;
}

/// The fields shared by every record of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportContext {
    group: String,
    run_id: RunUuid,
}

impl ReportContext {
    /// Creates a new context with a fresh run ID.
    pub fn new(group: impl Into<String>) -> Self {
        Self::with_run_id(group, RunUuid::new_v4())
    }

    /// Creates a new context with the given run ID.
    pub fn with_run_id(group: impl Into<String>, run_id: RunUuid) -> Self {
        Self {
            group: group.into(),
            run_id,
        }
    }

    /// Returns the group label.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the run ID.
    pub fn run_id(&self) -> RunUuid {
        self.run_id
    }

    /// Converts an outcome into the record that is reported for it.
    pub fn to_record(&self, outcome: &TestOutcome) -> OutcomeRecord {
        OutcomeRecord {
            test_name: outcome.name.clone(),
            status: outcome.status,
            detail: outcome.detail.clone(),
            start_time: outcome.start_time,
            end_time: outcome.end_time,
            group: self.group.clone(),
            run_id: self.run_id,
        }
    }
}

/// Counts of reported outcomes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// The run ID.
    pub run_id: RunUuid,

    /// The number of passed tests.
    pub passed: usize,

    /// The number of failed tests.
    pub failed: usize,

    /// The number of inconclusive tests that were recorded.
    pub inconclusive: usize,
}

impl RunSummary {
    /// Creates an empty summary.
    pub fn new(run_id: RunUuid) -> Self {
        Self {
            run_id,
            passed: 0,
            failed: 0,
            inconclusive: 0,
        }
    }

    /// Returns the total number of recorded outcomes.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.inconclusive
    }

    /// Returns true if no recorded outcome failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn add(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Inconclusive => self.inconclusive += 1,
        }
    }
}

/// Streams outcomes into every recorder, in order, then finishes each recorder.
///
/// Stops at the first recorder error.
pub fn report_outcomes(
    outcomes: impl IntoIterator<Item = TestOutcome>,
    cx: &ReportContext,
    recorders: &mut [&mut dyn OutcomeRecorder],
) -> Result<RunSummary, RecordError> {
    let mut summary = RunSummary::new(cx.run_id);
    for outcome in outcomes {
        let record = cx.to_record(&outcome);
        summary.add(record.status);
        for recorder in recorders.iter_mut() {
            recorder.record(&record, outcome.duration)?;
        }
    }

    for recorder in recorders.iter_mut() {
        recorder.finish(&summary)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct CollectRecorder {
        records: Vec<OutcomeRecord>,
        finished: Option<RunSummary>,
    }

    impl OutcomeRecorder for CollectRecorder {
        fn record(
            &mut self,
            record: &OutcomeRecord,
            _duration: Option<Duration>,
        ) -> Result<(), RecordError> {
            self.records.push(record.clone());
            Ok(())
        }

        fn finish(&mut self, summary: &RunSummary) -> Result<(), RecordError> {
            self.finished = Some(*summary);
            Ok(())
        }
    }

    fn outcome(name: &str, status: TestStatus, detail: &str) -> TestOutcome {
        let time = DateTime::parse_from_rfc3339("2024-03-01T10:00:00+00:00").expect("valid time");
        TestOutcome {
            name: name.to_owned(),
            status,
            detail: detail.to_owned(),
            start_time: time,
            end_time: time,
            duration: None,
        }
    }

    #[test]
    fn records_carry_group_and_run_id() {
        let cx = ReportContext::new("Unit Tests");
        let mut first = CollectRecorder::default();
        let mut second = CollectRecorder::default();

        let summary = report_outcomes(
            [
                outcome("t1", TestStatus::Passed, "Passed"),
                outcome("t2", TestStatus::Failed, "Assert.Fail"),
                outcome("t3", TestStatus::Inconclusive, "Ignored"),
                outcome("t1", TestStatus::Failed, ""),
            ],
            &cx,
            &mut [&mut first, &mut second],
        )
        .expect("recording succeeds");

        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.inconclusive, 1);
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_success());

        assert_eq!(first.records, second.records);
        assert_eq!(first.finished, Some(summary));
        let names: Vec<_> = first.records.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, ["t1", "t2", "t3", "t1"], "duplicate names are kept");
        for record in &first.records {
            assert_eq!(record.group, "Unit Tests");
            assert_eq!(record.run_id, cx.run_id());
        }
    }

    #[test]
    fn empty_run_is_success() {
        let cx = ReportContext::new("g");
        let summary = report_outcomes(Vec::new(), &cx, &mut []).expect("recording succeeds");
        assert_eq!(summary.total(), 0);
        assert!(summary.is_success());
    }
}
