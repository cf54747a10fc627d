// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use mstest_metadata::MsTestExitCode;
use mstest_runner::errors::{
    ConfigParseError, DisplayErrorChain, MalformedResultError, MissingOutputError, RecordError,
    ResultsDirError, RunError, RunnerConfigurationError, RunnerExecError,
};
use owo_colors::OwoColorize;
use std::{error::Error, path::PathBuf};
use thiserror::Error;
use tracing::error;

/// An error that is expected to happen and is reported with a stable exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    GetCurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { current_dir: PathBuf },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("error creating async runtime")]
    TokioRuntimeCreateError {
        #[source]
        err: std::io::Error,
    },
    #[error("runner configuration error")]
    RunnerConfigurationError {
        #[from]
        err: RunnerConfigurationError,
    },
    #[error("runner exec failed")]
    RunnerExecFailed {
        #[from]
        err: RunnerExecError,
    },
    #[error("missing test results")]
    MissingOutput {
        #[from]
        err: MissingOutputError,
    },
    #[error("results directory error")]
    ResultsDirError {
        #[from]
        err: ResultsDirError,
    },
    #[error("malformed result file")]
    MalformedResult {
        #[from]
        err: MalformedResultError,
    },
    #[error("error writing outcomes")]
    WriteOutputError {
        #[from]
        err: RecordError,
    },
    #[error("test run failed")]
    TestRunFailed { failed: usize, total: usize },
}

impl From<RunError> for ExpectedError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Configuration(err) => Self::RunnerConfigurationError { err },
            RunError::Exec(err) => Self::RunnerExecFailed { err },
            RunError::MissingOutput(err) => Self::MissingOutput { err },
            RunError::ResultsDir(err) => Self::ResultsDirError { err },
            RunError::MalformedResult(err) => Self::MalformedResult { err },
        }
    }
}

impl ExpectedError {
    pub(crate) fn current_dir_invalid(current_dir: PathBuf) -> Self {
        Self::CurrentDirInvalidUtf8 { current_dir }
    }

    pub(crate) fn test_run_failed(failed: usize, total: usize) -> Self {
        Self::TestRunFailed { failed, total }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::GetCurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::TokioRuntimeCreateError { .. }
            | Self::RunnerConfigurationError { .. } => MsTestExitCode::SETUP_ERROR,
            Self::RunnerExecFailed { .. } => MsTestExitCode::RUNNER_EXEC_FAILED,
            Self::MissingOutput { .. } | Self::ResultsDirError { .. } => {
                MsTestExitCode::MISSING_OUTPUT
            }
            Self::MalformedResult { .. } => MsTestExitCode::MALFORMED_RESULT,
            Self::WriteOutputError { .. } => MsTestExitCode::WRITE_OUTPUT_ERROR,
            Self::TestRunFailed { .. } => MsTestExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let next_error: Option<&dyn Error> = match self {
            Self::GetCurrentDirFailed { err } => {
                error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { current_dir } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    current_dir.display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config file `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::TokioRuntimeCreateError { err } => {
                error!("error creating async runtime");
                Some(err as &dyn Error)
            }
            Self::RunnerConfigurationError { err } => {
                error!("{err}");
                err.source()
            }
            Self::RunnerExecFailed { err } => {
                error!("failed to execute `{}`", err.command().style(styles.bold));
                err.source()
            }
            Self::MissingOutput { err } => {
                error!("{err}");
                None
            }
            Self::ResultsDirError { err } => Some(err as &dyn Error),
            Self::MalformedResult { err } => {
                error!(
                    "result file `{}` is malformed, no outcomes were reported",
                    err.path().style(styles.bold)
                );
                err.source()
            }
            Self::WriteOutputError { err } => Some(err as &dyn Error),
            Self::TestRunFailed { failed, total } => {
                error!(
                    "test run failed: {} of {} {} failed",
                    failed.style(styles.bold),
                    total.style(styles.bold),
                    if *total == 1 { "test" } else { "tests" },
                );
                None
            }
        };

        if let Some(next_error) = next_error {
            error!("{}", DisplayErrorChain::new(next_error));
        }
    }
}

