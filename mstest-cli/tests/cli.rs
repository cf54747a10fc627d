// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `mstest-run` binary end to end.

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::process::{Command, Output};

const MSTEST_RUN: &str = env!("CARGO_BIN_EXE_mstest-run");

fn mstest_run(cwd: &Utf8Path, args: &[&str]) -> Output {
    Command::new(MSTEST_RUN)
        .args(args)
        .current_dir(cwd)
        .env("MSTEST_COLOR", "never")
        .env_remove("MSTEST_LOG")
        .env_remove("VSTEST_EXE_PATH")
        .env_remove("ProgramFiles(x86)")
        .env_remove("ProgramFiles")
        .output()
        .expect("mstest-run executed")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is valid UTF-8")
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr is valid UTF-8")
}

#[test]
fn parse_passing_results() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    std::fs::write(
        dir.path().join("Smoke.trx"),
        indoc! {r#"
            <TestRun id="8c84fa94-04c1-424b-9868-57a2d4851a1d" name="run">
              <Results>
                <UnitTestResult testName="Adds" outcome="Passed" duration="00:00:00.0120000" />
                <UnitTestResult testName="Subtracts" outcome="passed" />
              </Results>
            </TestRun>
        "#},
    )
    .expect("wrote result file");

    let output = mstest_run(dir.path(), &["parse", "Smoke.trx"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        indoc! {"
                    PASS [   0.012s] Adds
                    PASS             Subtracts
            ------------
                 Summary 2 tests run: 2 passed, 0 failed
        "}
    );
}

#[test]
fn parse_failing_results_as_json() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    std::fs::write(
        dir.path().join("results.trx"),
        indoc! {r#"
            <TestRun id="8c84fa94-04c1-424b-9868-57a2d4851a1d" name="run">
              <Results>
                <UnitTestResult testName="Adds" outcome="Failed" startTime="2024-03-01T10:00:00+00:00">
                  <Output>
                    <ErrorInfo>
                      <Message>Assert.AreEqual failed.</Message>
                    </ErrorInfo>
                  </Output>
                </UnitTestResult>
              </Results>
            </TestRun>
        "#},
    )
    .expect("wrote result file");

    let output = mstest_run(
        dir.path(),
        &["parse", "results.trx", "--message-format", "json"],
    );
    assert_eq!(output.status.code(), Some(100), "stderr: {}", stderr(&output));

    let records: Vec<mstest_metadata::OutcomeRecord> = stdout(&output)
        .lines()
        .map(|line| mstest_metadata::OutcomeRecord::from_json_line(line).expect("valid record"))
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].test_name, "Adds");
    assert_eq!(records[0].detail, "Assert.AreEqual failed.");
    assert_eq!(records[0].group, "results");
    assert_eq!(records[0].start_time, records[0].end_time);
    assert!(
        stderr(&output).contains("error: test run failed: 1 of 1 test failed"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn parse_missing_structure() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    std::fs::write(dir.path().join("results.trx"), "<TestRun></TestRun>")
        .expect("wrote result file");

    let output = mstest_run(dir.path(), &["parse", "results.trx"]);
    assert_eq!(output.status.code(), Some(103), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "");
}

#[test]
fn run_without_runner_path() {
    let dir = Utf8TempDir::new().expect("created temp dir");

    let output = mstest_run(dir.path(), &["run", "Unit.dll", "--runner", "mstest"]);
    assert_eq!(output.status.code(), Some(96), "stderr: {}", stderr(&output));
    assert!(
        stderr(&output).contains("runner.path must be set to run mstest tests"),
        "stderr: {}",
        stderr(&output)
    );

    let output = mstest_run(dir.path(), &["run", "Unit.dll"]);
    assert_eq!(output.status.code(), Some(96), "stderr: {}", stderr(&output));
    assert!(
        stderr(&output).contains("neither ProgramFiles(x86) nor ProgramFiles is set"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn vstest_exe_path_ignored_for_mstest() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let vstest = dir.path().join("vstest.console.exe");
    std::fs::write(&vstest, "").expect("wrote runner");

    let output = Command::new(MSTEST_RUN)
        .args(["run", "Unit.dll", "--runner", "mstest"])
        .current_dir(dir.path())
        .env("MSTEST_COLOR", "never")
        .env("VSTEST_EXE_PATH", &vstest)
        .output()
        .expect("mstest-run executed");
    assert_eq!(output.status.code(), Some(96), "stderr: {}", stderr(&output));
    assert!(
        stderr(&output).contains("runner.path must be set to run mstest tests"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn run_with_missing_runner_path() {
    let dir = Utf8TempDir::new().expect("created temp dir");

    let output = mstest_run(
        dir.path(),
        &["run", "Unit.dll", "--runner-path", "tools/vstest.console.exe"],
    );
    assert_eq!(output.status.code(), Some(96), "stderr: {}", stderr(&output));
    assert!(
        stderr(&output).contains("runner executable not found at path `tools/vstest.console.exe`"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn config_file_selects_runner() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    std::fs::create_dir(dir.path().join(".config")).expect("created config dir");
    std::fs::write(
        dir.path().join(".config/mstest.toml"),
        indoc! {r#"
            [runner]
            kind = "mstest"
        "#},
    )
    .expect("wrote config file");

    let output = mstest_run(dir.path(), &["run", "Unit.dll"]);
    assert_eq!(output.status.code(), Some(96), "stderr: {}", stderr(&output));
    assert!(
        stderr(&output).contains("runner.path must be set to run mstest tests"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn locate_newest_installation() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    for version in ["11.0", "14.0", "12.0"] {
        let exe = dir
            .path()
            .join(format!("Microsoft Visual Studio {version}"))
            .join("Common7/IDE/CommonExtensions/Microsoft/TestWindow/vstest.console.exe");
        std::fs::create_dir_all(exe.parent().expect("exe has a parent"))
            .expect("created installation dir");
        std::fs::write(&exe, "").expect("wrote runner");
    }

    let output = Command::new(MSTEST_RUN)
        .arg("locate")
        .current_dir(dir.path())
        .env("MSTEST_COLOR", "never")
        .env("ProgramFiles(x86)", dir.path())
        .output()
        .expect("mstest-run executed");
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let located = stdout(&output);
    assert!(
        located
            .trim_end()
            .ends_with("vstest.console.exe"),
        "located: {located}"
    );
    assert!(
        located.contains("Microsoft Visual Studio 14.0"),
        "newest installation wins: {located}"
    );
}
