// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeRecorder, RunSummary};
use crate::errors::RecordError;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use mstest_metadata::{OutcomeRecord, TestStatus};
use newtype_uuid::GenericUuid;
use quick_junit::{NonSuccessKind, Report, ReportUuid, TestCase, TestCaseStatus, TestSuite};
use std::{fs::File, time::Duration};

/// Collects records into a JUnit XML report, written out when the run finishes.
///
/// Records are grouped into one test suite per group label. Inconclusive outcomes are reported
/// as skipped.
#[derive(Debug)]
pub struct JunitRecorder {
    path: Utf8PathBuf,
    report_name: String,
    test_suites: IndexMap<String, TestSuite>,
    first_start: Option<DateTime<FixedOffset>>,
    last_end: Option<DateTime<FixedOffset>>,
}

impl JunitRecorder {
    /// The default name of the report.
    pub const DEFAULT_REPORT_NAME: &'static str = "mstest-run";

    /// Creates a new recorder that writes to `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            report_name: Self::DEFAULT_REPORT_NAME.to_owned(),
            test_suites: IndexMap::new(),
            first_start: None,
            last_end: None,
        }
    }

    /// Sets the name of the report.
    pub fn set_report_name(&mut self, report_name: impl Into<String>) -> &mut Self {
        self.report_name = report_name.into();
        self
    }

    /// Returns the path the report is written to.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn test_suite_for(&mut self, group: &str) -> &mut TestSuite {
        self.test_suites
            .entry(group.to_owned())
            .or_insert_with(|| TestSuite::new(group))
    }
}

impl OutcomeRecorder for JunitRecorder {
    fn record(
        &mut self,
        record: &OutcomeRecord,
        duration: Option<Duration>,
    ) -> Result<(), RecordError> {
        let status = match record.status {
            TestStatus::Passed => TestCaseStatus::success(),
            TestStatus::Failed => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                if let Some(message) = record.detail.lines().next() {
                    status.set_message(message);
                }
                status.set_description(record.detail.as_str());
                status
            }
            TestStatus::Inconclusive => {
                let mut status = TestCaseStatus::skipped();
                status.set_message(record.detail.as_str());
                status
            }
        };

        let time = duration.unwrap_or_else(|| {
            (record.end_time - record.start_time)
                .to_std()
                .unwrap_or_default()
        });
        let mut test_case = TestCase::new(record.test_name.as_str(), status);
        test_case
            .set_classname(record.group.as_str())
            .set_timestamp(record.start_time)
            .set_time(time);
        self.test_suite_for(&record.group).add_test_case(test_case);

        if self.first_start.is_none_or(|start| record.start_time < start) {
            self.first_start = Some(record.start_time);
        }
        if self.last_end.is_none_or(|end| record.end_time > end) {
            self.last_end = Some(record.end_time);
        }
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), RecordError> {
        let mut report = Report::new(self.report_name.as_str());
        report.set_report_uuid(ReportUuid::from_untyped_uuid(
            summary.run_id.into_untyped_uuid(),
        ));
        if let (Some(start), Some(end)) = (self.first_start, self.last_end) {
            report
                .set_timestamp(start)
                .set_time((end - start).to_std().unwrap_or_default());
        }
        report.add_test_suites(self.test_suites.drain(..).map(|(_, suite)| suite));

        if let Some(junit_dir) = self.path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(junit_dir).map_err(|error| RecordError::Fs {
                file: junit_dir.to_path_buf(),
                error,
            })?;
        }

        let f = File::create(&self.path).map_err(|error| RecordError::Fs {
            file: self.path.clone(),
            error,
        })?;
        report.serialize(f).map_err(|error| RecordError::Junit {
            file: self.path.clone(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mstest_metadata::RunUuid;

    fn record(name: &str, status: TestStatus, detail: &str, start: &str, end: &str) -> OutcomeRecord {
        OutcomeRecord {
            test_name: name.to_owned(),
            status,
            detail: detail.to_owned(),
            start_time: DateTime::parse_from_rfc3339(start).expect("valid time"),
            end_time: DateTime::parse_from_rfc3339(end).expect("valid time"),
            group: "Unit Tests".to_owned(),
            run_id: RunUuid::new_v4(),
        }
    }

    #[test]
    fn suites_in_first_seen_order() {
        let temp = camino_tempfile::tempdir().expect("created temp dir");
        let path = temp.path().join("junit.xml");
        let mut recorder = JunitRecorder::new(&path);

        for (name, group) in [("t1", "Unit"), ("t2", "Integration"), ("t3", "Unit")] {
            let mut record = record(
                name,
                TestStatus::Passed,
                "Passed",
                "2024-03-01T10:00:00+00:00",
                "2024-03-01T10:00:01+00:00",
            );
            record.group = group.to_owned();
            recorder.record(&record, None).expect("recorded");
        }
        let run_id = RunUuid::new_v4();
        recorder
            .finish(&RunSummary::new(run_id))
            .expect("report written");

        let xml = std::fs::read_to_string(&path).expect("report exists");
        assert_eq!(xml.matches("<testsuite ").count(), 2, "{xml}");
        let unit = xml.find(r#"<testsuite name="Unit""#).expect("Unit suite");
        let integration = xml
            .find(r#"<testsuite name="Integration""#)
            .expect("Integration suite");
        assert!(unit < integration, "suites are in first-seen order:\n{xml}");
        assert!(
            xml.contains(&format!(r#"uuid="{run_id}""#)),
            "report carries the run ID:\n{xml}"
        );
    }

    #[test]
    fn writes_report() {
        let temp = camino_tempfile::tempdir().expect("created temp dir");
        let path = temp.path().join("out/junit.xml");
        let mut recorder = JunitRecorder::new(&path);

        recorder
            .record(
                &record(
                    "t1",
                    TestStatus::Passed,
                    "Passed",
                    "2024-03-01T10:00:00+00:00",
                    "2024-03-01T10:00:01+00:00",
                ),
                Some(Duration::from_millis(250)),
            )
            .expect("recorded");
        recorder
            .record(
                &record(
                    "t2",
                    TestStatus::Failed,
                    "Assert.Fail\n   at T2()",
                    "2024-03-01T10:00:01+00:00",
                    "2024-03-01T10:00:02+00:00",
                ),
                None,
            )
            .expect("recorded");
        recorder
            .record(
                &record(
                    "t3",
                    TestStatus::Inconclusive,
                    "Ignored",
                    "2024-03-01T10:00:02+00:00",
                    "2024-03-01T10:00:02+00:00",
                ),
                None,
            )
            .expect("recorded");
        recorder
            .finish(&RunSummary::new(RunUuid::new_v4()))
            .expect("report written");

        let xml = std::fs::read_to_string(&path).expect("report exists");
        for expected in [
            r#"<testsuite name="Unit Tests""#,
            r#"tests="3""#,
            r#"failures="1""#,
            r#"<testcase name="t1""#,
            r#"classname="Unit Tests""#,
            r#"message="Assert.Fail""#,
            "<skipped",
        ] {
            assert!(xml.contains(expected), "report contains {expected}:\n{xml}");
        }
    }
}
