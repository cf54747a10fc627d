// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{errors::RunnerConfigurationError, request::RunRequest, test_command::RunnerCommand};
use camino::{Utf8Path, Utf8PathBuf};
use quick_trx::ResultsScope;
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// The file name that legacy mstest.exe writes results to, in the container's directory.
pub const MSTEST_RESULTS_FILE_NAME: &str = "mstestresults.xml";

/// The extension of result files written by vstest.console.exe.
pub const TRX_EXTENSION: &str = "trx";

/// A test runner generation.
///
/// The two generations are not command-line compatible, and leave their results in different
/// places.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum RunnerKind {
    /// `vstest.console.exe`, which writes a fresh `.trx` file into `<container dir>/TestResults`
    /// on each run.
    #[default]
    #[serde(rename = "vstest")]
    VsTest,

    /// The legacy `mstest.exe`, which writes `<container dir>/mstestresults.xml`.
    #[serde(rename = "mstest")]
    MsTest,
}

impl RunnerKind {
    /// Returns the string representations of all runner kinds.
    pub fn variants() -> &'static [&'static str] {
        &["vstest", "mstest"]
    }

    /// Returns the name of the runner executable.
    pub fn executable_name(self) -> &'static str {
        match self {
            RunnerKind::VsTest => "vstest.console.exe",
            RunnerKind::MsTest => "mstest.exe",
        }
    }

    /// Returns true if this runner can be located without an explicit path.
    pub fn supports_discovery(self) -> bool {
        matches!(self, RunnerKind::VsTest)
    }

    /// Returns which `UnitTestResult` elements are read from this runner's result documents.
    ///
    /// mstest.exe nests the results of data-driven and ordered tests inside their parent
    /// result, so every result below `Results` is read.
    pub fn results_scope(self) -> ResultsScope {
        match self {
            RunnerKind::VsTest => ResultsScope::Children,
            RunnerKind::MsTest => ResultsScope::Descendants,
        }
    }

    /// Returns where this runner leaves its result document for the given request.
    pub fn result_location(self, request: &RunRequest) -> ResultLocation {
        match self {
            RunnerKind::VsTest => ResultLocation::Newest {
                dir: request.results_dir(),
                extension: TRX_EXTENSION,
            },
            RunnerKind::MsTest => ResultLocation::Fixed {
                path: request.container_dir().join(MSTEST_RESULTS_FILE_NAME),
            },
        }
    }

    /// Builds the command line that runs the request's container with the given executable.
    ///
    /// The additional arguments are appended verbatim.
    pub fn build_command(
        self,
        runner_path: &Utf8Path,
        request: &RunRequest,
    ) -> Result<RunnerCommand, RunnerConfigurationError> {
        let container_dir = request.container_dir();
        let container = request.container_path();

        let mut args = Vec::new();
        match self {
            RunnerKind::VsTest => {
                args.push(format!("\"{container}\""));
                args.push("/logger:trx".to_owned());
            }
            RunnerKind::MsTest => {
                let results_file = container_dir.join(MSTEST_RESULTS_FILE_NAME);
                args.push(format!("/resultsfile:\"{results_file}\""));
                args.push("/nologo".to_owned());
                args.push(format!("/testcontainer:\"{container}\""));
                if let Some(settings) = request.test_settings() {
                    let settings = container_dir.join(settings);
                    args.push(format!("/testsettings:\"{settings}\""));
                }
            }
        }

        RunnerCommand::new(runner_path, container_dir, args, request.additional_args()).map_err(
            |err| RunnerConfigurationError::InvalidArguments {
                args: request.additional_args().to_owned(),
                err,
            },
        )
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerKind::VsTest => write!(f, "vstest"),
            RunnerKind::MsTest => write!(f, "mstest"),
        }
    }
}

impl FromStr for RunnerKind {
    type Err = RunnerKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vstest" => Ok(RunnerKind::VsTest),
            "mstest" => Ok(RunnerKind::MsTest),
            other => Err(RunnerKindParseError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Error returned while parsing a [`RunnerKind`] value from a string.
#[derive(Clone, Debug, thiserror::Error)]
#[error(
    "unrecognized value for runner kind: {input}\n(known values: {})",
    RunnerKind::variants().join(", "),
)]
pub struct RunnerKindParseError {
    input: String,
}

/// Where a runner leaves its result document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultLocation {
    /// The most recently modified file with the given extension in a directory.
    Newest {
        /// The directory to search.
        dir: Utf8PathBuf,

        /// The extension to look for, compared case-insensitively.
        extension: &'static str,
    },

    /// A single, fixed file.
    Fixed {
        /// The path to the file.
        path: Utf8PathBuf,
    },
}
