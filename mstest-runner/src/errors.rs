// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by mstest-runner.

use crate::runner::RunnerKind;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error::Error, fmt};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse mstest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// The runner executable is missing, unset or could not be discovered.
///
/// No process is spawned when this error occurs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerConfigurationError {
    /// An explicit runner path was configured, but no file exists there.
    #[error("runner executable not found at path `{path}`")]
    NotFound {
        /// The configured path.
        path: Utf8PathBuf,
    },

    /// No runner path was configured and auto-discovery found nothing.
    #[error(
        "unable to find vstest.console.exe under `{search_root}`; \
         verify that VSTest is installed and set runner.path (or VSTEST_EXE_PATH) to its full path"
    )]
    NotDiscovered {
        /// The directory that was searched.
        search_root: Utf8PathBuf,
    },

    /// Auto-discovery had no directory to search.
    #[error(
        "unable to find vstest.console.exe: neither ProgramFiles(x86) nor ProgramFiles is set; \
         set runner.path (or VSTEST_EXE_PATH) to its full path"
    )]
    NoSearchRoot,

    /// The runner kind does not support auto-discovery and no path was configured.
    #[error("runner.path must be set to run {kind} tests")]
    PathRequired {
        /// The runner kind.
        kind: RunnerKind,
    },

    /// The additional arguments could not be split into an argument list.
    #[error("additional arguments `{args}` could not be parsed")]
    InvalidArguments {
        /// The additional arguments as configured.
        args: String,

        /// The underlying error.
        #[source]
        err: shell_words::ParseError,
    },
}

/// The runner executable could not be spawned or waited on.
#[derive(Debug, Error)]
#[error("failed to execute `{command}`")]
pub struct RunnerExecError {
    command: String,
    #[source]
    err: std::io::Error,
}

impl RunnerExecError {
    pub(crate) fn new(command: impl Into<String>, err: std::io::Error) -> Self {
        Self {
            command: command.into(),
            err,
        }
    }

    /// Returns the command line that was being executed.
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// The runner exited without leaving a result document behind.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MissingOutputError {
    /// The results directory does not exist.
    #[error("could not find the generated results directory `{dir}` after running unit tests")]
    ResultsDirNotFound {
        /// The expected results directory.
        dir: Utf8PathBuf,
    },

    /// The results directory has no result files in it.
    #[error("there are no .{extension} files in the results directory `{dir}`")]
    NoResultFiles {
        /// The results directory.
        dir: Utf8PathBuf,

        /// The result file extension that was searched for.
        extension: &'static str,
    },

    /// A fixed-path result file does not exist.
    #[error("could not find the result file `{path}` after running unit tests")]
    ResultFileNotFound {
        /// The expected result file.
        path: Utf8PathBuf,
    },
}

/// An I/O error occurred while clearing or listing a results directory, or
/// while reading a result file.
#[derive(Debug, Error)]
#[error("error {action} `{path}`")]
pub struct ResultsDirError {
    action: ResultsDirAction,
    path: Utf8PathBuf,
    #[source]
    err: std::io::Error,
}

impl ResultsDirError {
    pub(crate) fn new(
        action: ResultsDirAction,
        path: impl Into<Utf8PathBuf>,
        err: std::io::Error,
    ) -> Self {
        Self {
            action,
            path: path.into(),
            err,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum ResultsDirAction {
    Clearing,
    Listing,
    Removing,
    Reading,
}

impl fmt::Display for ResultsDirAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsDirAction::Clearing => write!(f, "clearing"),
            ResultsDirAction::Listing => write!(f, "listing"),
            ResultsDirAction::Removing => write!(f, "removing"),
            ResultsDirAction::Reading => write!(f, "reading"),
        }
    }
}

/// A result file exists but does not have the expected shape.
///
/// No outcomes are reported when this error occurs.
#[derive(Debug, Error)]
#[error("result file `{path}` is malformed")]
pub struct MalformedResultError {
    path: Utf8PathBuf,
    #[source]
    err: quick_trx::ReadError,
}

impl MalformedResultError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: quick_trx::ReadError) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }

    /// Returns the path to the malformed result file.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that aborts a single test runner invocation.
///
/// Every variant is terminal: nothing is retried.
#[derive(Debug, Error)]
pub enum RunError {
    /// The runner executable is missing or could not be discovered.
    #[error(transparent)]
    Configuration(#[from] RunnerConfigurationError),

    /// The runner could not be spawned.
    #[error(transparent)]
    Exec(#[from] RunnerExecError),

    /// No result document was produced.
    #[error(transparent)]
    MissingOutput(#[from] MissingOutputError),

    /// The results directory or result file could not be accessed.
    #[error(transparent)]
    ResultsDir(#[from] ResultsDirError),

    /// The result document does not have the expected shape.
    #[error(transparent)]
    MalformedResult(#[from] MalformedResultError),
}

/// An error that occurred while recording an outcome.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// An error occurred while writing to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while serializing a record as JSON.
    #[error("error serializing outcome record")]
    Json(#[source] serde_json::Error),

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },
}

/// Displays an error along with its chain of causes, separated by `: `.
pub struct DisplayErrorChain<E>(E);

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
