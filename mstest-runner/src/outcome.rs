// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalizes parsed TRX results into test outcomes.
//!
//! A [`TestRun`] holds the raw `UnitTestResult` elements of a document. [`Outcomes`] walks them
//! once, in document order, mapping each to a [`TestOutcome`] with a ternary [`TestStatus`] and a
//! diagnostic detail string.

use chrono::{DateTime, FixedOffset, Local};
pub use mstest_metadata::TestStatus;
use quick_trx::{TestRun, UnitTestResult};
use serde::Deserialize;
use std::{fmt, str::FromStr, time::Duration, vec};

/// The line break placed between a failure message and its stack trace.
pub const DETAIL_LINE_BREAK: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Detail text for passing tests.
pub const PASSED_DETAIL: &str = "Passed";

/// Detail text for tests that were skipped without producing any output.
pub const IGNORED_DETAIL: &str = "Ignored";

/// How inconclusive outcomes are handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InconclusivePolicy {
    /// Inconclusive outcomes are emitted like any other outcome.
    #[default]
    Record,

    /// Inconclusive outcomes are logged, but not emitted.
    LogOnly,
}

impl InconclusivePolicy {
    /// Returns the string representations of all policies.
    pub fn variants() -> &'static [&'static str] {
        &["record", "log-only"]
    }
}

impl fmt::Display for InconclusivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconclusivePolicy::Record => write!(f, "record"),
            InconclusivePolicy::LogOnly => write!(f, "log-only"),
        }
    }
}

impl FromStr for InconclusivePolicy {
    type Err = InconclusivePolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(InconclusivePolicy::Record),
            "log-only" => Ok(InconclusivePolicy::LogOnly),
            other => Err(InconclusivePolicyParseError::new(other)),
        }
    }
}

/// Error returned while parsing an [`InconclusivePolicy`] value from a string.
#[derive(Clone, Debug, thiserror::Error)]
#[error(
    "unrecognized value for inconclusive policy: {input}\n(known values: {})",
    InconclusivePolicy::variants().join(", "),
)]
pub struct InconclusivePolicyParseError {
    input: String,
}

impl InconclusivePolicyParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// The normalized outcome of a single `UnitTestResult`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    /// The test name. Not guaranteed to be unique within a run.
    pub name: String,

    /// The ternary verdict.
    pub status: TestStatus,

    /// [`PASSED_DETAIL`] for passing tests. Otherwise the failure message, followed by
    /// [`DETAIL_LINE_BREAK`] and the stack trace if there is one, or [`IGNORED_DETAIL`] for
    /// inconclusive tests with no output at all.
    pub detail: String,

    /// When the test started.
    pub start_time: DateTime<FixedOffset>,

    /// When the test ended. Never earlier than `start_time`.
    pub end_time: DateTime<FixedOffset>,

    /// The duration reported by the runner, if any.
    pub duration: Option<Duration>,
}

impl TestOutcome {
    /// Normalizes a single result. `now` is used for missing timestamps.
    pub fn from_result(result: UnitTestResult, now: DateTime<FixedOffset>) -> Self {
        let status = status_for_outcome(&result.outcome);
        let detail = match status {
            TestStatus::Passed => PASSED_DETAIL.to_owned(),
            TestStatus::Inconclusive if result.output.is_none() => IGNORED_DETAIL.to_owned(),
            TestStatus::Inconclusive | TestStatus::Failed => error_detail(&result),
        };

        let start_time = result.start_time.or(result.end_time).unwrap_or(now);
        let end_time = result.end_time.unwrap_or(start_time).max(start_time);

        Self {
            name: result.test_name,
            status,
            detail,
            start_time,
            end_time,
            duration: result.duration,
        }
    }
}

/// Maps a raw `outcome` attribute to a status, ignoring case.
///
/// `Passed` maps to [`TestStatus::Passed`], `NotExecuted` to [`TestStatus::Inconclusive`], and
/// every other value to [`TestStatus::Failed`].
pub fn status_for_outcome(outcome: &str) -> TestStatus {
    if outcome.eq_ignore_ascii_case("Passed") {
        TestStatus::Passed
    } else if outcome.eq_ignore_ascii_case("NotExecuted") {
        TestStatus::Inconclusive
    } else {
        TestStatus::Failed
    }
}

fn error_detail(result: &UnitTestResult) -> String {
    let Some(error_info) = result.error_info() else {
        return String::new();
    };

    let mut detail = error_info.message.clone().unwrap_or_default();
    if let Some(trace) = error_info.stack_trace.as_deref().filter(|t| !t.is_empty()) {
        detail.push_str(DETAIL_LINE_BREAK);
        detail.push_str(trace);
    }
    detail
}

/// A lazy, single-pass sequence of [`TestOutcome`]s in document order.
///
/// Created by [`Outcomes::new`]. Consuming the iterator consumes the parsed document; read the
/// result file again to start over.
#[derive(Debug)]
pub struct Outcomes {
    results: vec::IntoIter<UnitTestResult>,
    now: DateTime<FixedOffset>,
    policy: InconclusivePolicy,
}

impl Outcomes {
    /// Creates a new sequence over the results of `test_run`, using the current local time for
    /// missing timestamps.
    pub fn new(test_run: TestRun, policy: InconclusivePolicy) -> Self {
        Self::with_now(test_run, policy, Local::now().fixed_offset())
    }

    /// Creates a new sequence with an explicit time for missing timestamps.
    pub fn with_now(
        test_run: TestRun,
        policy: InconclusivePolicy,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            results: test_run.results.into_iter(),
            now,
            policy,
        }
    }

    /// Returns the number of results that have not been visited yet.
    ///
    /// Under [`InconclusivePolicy::LogOnly`] this is an upper bound on the number of outcomes
    /// still to be emitted.
    pub fn remaining_results(&self) -> usize {
        self.results.len()
    }
}

impl Iterator for Outcomes {
    type Item = TestOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        for result in self.results.by_ref() {
            let outcome = TestOutcome::from_result(result, self.now);
            if outcome.status == TestStatus::Inconclusive
                && self.policy == InconclusivePolicy::LogOnly
            {
                tracing::info!(
                    "test {} was inconclusive ({}); not recorded",
                    outcome.name,
                    outcome.detail,
                );
                continue;
            }
            return Some(outcome);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.policy {
            InconclusivePolicy::Record => (self.results.len(), Some(self.results.len())),
            InconclusivePolicy::LogOnly => (0, Some(self.results.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use quick_trx::{ErrorInfo, Output, ResultsScope};
    use test_case::test_case;

    fn parse_time(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).expect("valid timestamp")
    }

    fn fixed_now() -> DateTime<FixedOffset> {
        parse_time("2030-01-01T00:00:00+00:00")
    }

    #[test_case("Passed", TestStatus::Passed ; "passed")]
    #[test_case("passed", TestStatus::Passed ; "passed lowercase")]
    #[test_case("PASSED", TestStatus::Passed ; "passed uppercase")]
    #[test_case("NotExecuted", TestStatus::Inconclusive ; "not executed")]
    #[test_case("notexecuted", TestStatus::Inconclusive ; "not executed lowercase")]
    #[test_case("Failed", TestStatus::Failed ; "failed")]
    #[test_case("Timeout", TestStatus::Failed ; "timeout")]
    #[test_case("Inconclusive", TestStatus::Failed ; "inconclusive outcome string")]
    #[test_case("", TestStatus::Failed ; "empty")]
    fn status_mapping(outcome: &str, expected: TestStatus) {
        assert_eq!(status_for_outcome(outcome), expected);
    }

    fn with_error_info(outcome: &str, message: Option<&str>, trace: Option<&str>) -> UnitTestResult {
        let mut output = Output::new();
        output.set_error_info(ErrorInfo::new(
            message.map(str::to_owned),
            trace.map(str::to_owned),
        ));
        let mut result = UnitTestResult::new("t", outcome);
        result.set_output(output);
        result
    }

    #[test]
    fn detail_message_and_trace() {
        let outcome = TestOutcome::from_result(
            with_error_info("Failed", Some("M"), Some("S")),
            fixed_now(),
        );
        assert_eq!(outcome.detail, format!("M{DETAIL_LINE_BREAK}S"));
    }

    #[test]
    fn detail_message_only() {
        let outcome =
            TestOutcome::from_result(with_error_info("Failed", Some("M"), None), fixed_now());
        assert_eq!(outcome.detail, "M");

        let outcome =
            TestOutcome::from_result(with_error_info("Failed", Some("M"), Some("")), fixed_now());
        assert_eq!(outcome.detail, "M", "empty stack trace is not appended");
    }

    #[test]
    fn detail_neither() {
        let outcome =
            TestOutcome::from_result(with_error_info("Failed", None, None), fixed_now());
        assert_eq!(outcome.detail, "");

        let outcome = TestOutcome::from_result(UnitTestResult::new("t", "Failed"), fixed_now());
        assert_eq!(outcome.detail, "", "failed test without output");
    }

    #[test]
    fn passed_detail_ignores_output() {
        let outcome = TestOutcome::from_result(
            with_error_info("Passed", Some("M"), Some("S")),
            fixed_now(),
        );
        assert_eq!(outcome.status, TestStatus::Passed);
        assert_eq!(outcome.detail, PASSED_DETAIL);
    }

    #[test]
    fn inconclusive_detail() {
        let outcome =
            TestOutcome::from_result(UnitTestResult::new("t", "NotExecuted"), fixed_now());
        assert_eq!(outcome.detail, IGNORED_DETAIL);

        let mut result = UnitTestResult::new("t", "NotExecuted");
        result.set_output(Output::new());
        let outcome = TestOutcome::from_result(result, fixed_now());
        assert_eq!(outcome.detail, "", "output present but no error info");

        let outcome = TestOutcome::from_result(
            with_error_info("NotExecuted", Some("skipped: needs GPU"), None),
            fixed_now(),
        );
        assert_eq!(outcome.detail, "skipped: needs GPU");
    }

    #[test]
    fn missing_end_time_defaults_to_start() {
        let start = parse_time("2024-03-01T10:00:00+00:00");
        let mut result = UnitTestResult::new("t", "Passed");
        result.set_start_time(start);

        let outcome = TestOutcome::from_result(result, fixed_now());
        assert_eq!(outcome.start_time, start);
        assert_eq!(outcome.end_time, start);
    }

    #[test]
    fn missing_start_time_never_yields_negative_duration() {
        let end = parse_time("2024-03-01T10:00:00+00:00");
        let mut result = UnitTestResult::new("t", "Passed");
        result.set_end_time(end);

        let outcome = TestOutcome::from_result(result, fixed_now());
        assert_eq!(outcome.start_time, end);
        assert_eq!(outcome.end_time, end);
    }

    #[test]
    fn end_time_before_start_time_is_clamped() {
        let mut result = UnitTestResult::new("t", "Passed");
        result
            .set_start_time(parse_time("2024-03-01T10:00:05+00:00"))
            .set_end_time(parse_time("2024-03-01T10:00:00+00:00"));

        let outcome = TestOutcome::from_result(result, fixed_now());
        assert_eq!(outcome.end_time, outcome.start_time);
    }

    #[test]
    fn missing_timestamps_default_to_now() {
        let before = Local::now().fixed_offset();
        let mut run = TestRun::new();
        run.add_result(UnitTestResult::new("t", "Passed"));
        let outcome = Outcomes::new(run, InconclusivePolicy::Record)
            .next()
            .expect("one outcome");
        let after = Local::now().fixed_offset();

        assert!(
            before <= outcome.start_time && outcome.start_time <= after,
            "start time {} is approximately now",
            outcome.start_time,
        );
        assert_eq!(outcome.end_time, outcome.start_time);
    }

    static MIXED: &str = indoc! {r#"
        <TestRun xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
          <Results>
            <UnitTestResult testName="t1" outcome="Passed" startTime="2024-03-01T10:00:00+00:00" endTime="2024-03-01T10:00:01+00:00" />
            <UnitTestResult testName="t2" outcome="Failed" startTime="2024-03-01T10:00:01+00:00" endTime="2024-03-01T10:00:02+00:00">
              <Output><ErrorInfo><Message>Assert.Fail</Message></ErrorInfo></Output>
            </UnitTestResult>
            <UnitTestResult testName="t3" outcome="NotExecuted" />
          </Results>
        </TestRun>
    "#};

    fn summarize(outcomes: Outcomes) -> Vec<(String, TestStatus, String)> {
        outcomes
            .map(|outcome| (outcome.name, outcome.status, outcome.detail))
            .collect()
    }

    #[test]
    fn record_policy_emits_every_result() {
        let run = TestRun::from_str(MIXED, ResultsScope::Children).expect("valid document");
        let outcomes = Outcomes::with_now(run, InconclusivePolicy::Record, fixed_now());
        assert_eq!(outcomes.size_hint(), (3, Some(3)));
        assert_eq!(
            summarize(outcomes),
            [
                ("t1".to_owned(), TestStatus::Passed, "Passed".to_owned()),
                ("t2".to_owned(), TestStatus::Failed, "Assert.Fail".to_owned()),
                ("t3".to_owned(), TestStatus::Inconclusive, "Ignored".to_owned()),
            ]
        );
    }

    #[test]
    fn log_only_policy_drops_inconclusive() {
        let run = TestRun::from_str(MIXED, ResultsScope::Children).expect("valid document");
        let outcomes = Outcomes::with_now(run, InconclusivePolicy::LogOnly, fixed_now());
        assert_eq!(
            summarize(outcomes),
            [
                ("t1".to_owned(), TestStatus::Passed, "Passed".to_owned()),
                ("t2".to_owned(), TestStatus::Failed, "Assert.Fail".to_owned()),
            ]
        );
    }

    #[test]
    fn outcomes_are_single_pass() {
        let run = TestRun::from_str(MIXED, ResultsScope::Children).expect("valid document");
        let mut outcomes = Outcomes::with_now(run, InconclusivePolicy::Record, fixed_now());
        assert_eq!(outcomes.by_ref().count(), 3);
        assert_eq!(outcomes.remaining_results(), 0);
        assert_eq!(outcomes.next(), None);
    }

    #[test_case("record", Ok(InconclusivePolicy::Record) ; "record")]
    #[test_case("log-only", Ok(InconclusivePolicy::LogOnly) ; "log only")]
    #[test_case("skip", Err(()) ; "unknown")]
    fn policy_from_str(input: &str, expected: Result<InconclusivePolicy, ()>) {
        assert_eq!(input.parse::<InconclusivePolicy>().map_err(|_| ()), expected);
    }
}
