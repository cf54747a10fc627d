// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The input to a single test runner invocation.

use crate::{config::RunnerConfig, runner::RunnerKind};
use camino::{Utf8Path, Utf8PathBuf};

/// The name of the directory, next to the test container, that VSTest writes results into.
pub const RESULTS_DIR_NAME: &str = "TestResults";

/// Everything needed to run the tests in one test container.
///
/// A request is assembled right before an invocation and is never modified by it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    container_path: Utf8PathBuf,
    kind: RunnerKind,
    runner_path: Option<Utf8PathBuf>,
    additional_args: String,
    clear_results: bool,
    test_settings: Option<String>,
}

impl RunRequest {
    /// Creates a new request for the given container, with no additional arguments.
    pub fn new(container_path: impl Into<Utf8PathBuf>, kind: RunnerKind) -> Self {
        Self {
            container_path: container_path.into(),
            kind,
            runner_path: None,
            additional_args: String::new(),
            clear_results: false,
            test_settings: None,
        }
    }

    /// Creates a new request for the given container from the runner configuration.
    pub fn from_config(container_path: impl Into<Utf8PathBuf>, config: &RunnerConfig) -> Self {
        let mut request = Self::new(container_path, config.kind());
        request.runner_path = config.path().map(Utf8Path::to_path_buf);
        request.additional_args = config.additional_args().to_owned();
        request.clear_results = config.clear_results();
        request.test_settings = config.test_settings().map(str::to_owned);
        request
    }

    /// Sets the runner kind.
    pub fn set_kind(&mut self, kind: RunnerKind) -> &mut Self {
        self.kind = kind;
        self
    }

    /// Sets an explicit path to the runner executable, disabling auto-discovery.
    pub fn set_runner_path(&mut self, runner_path: impl Into<Utf8PathBuf>) -> &mut Self {
        self.runner_path = Some(runner_path.into());
        self
    }

    /// Sets the arguments appended verbatim to the runner's command line.
    pub fn set_additional_args(&mut self, additional_args: impl Into<String>) -> &mut Self {
        self.additional_args = additional_args.into();
        self
    }

    /// Sets whether the results directory is cleared before the runner is invoked.
    pub fn set_clear_results(&mut self, clear_results: bool) -> &mut Self {
        self.clear_results = clear_results;
        self
    }

    /// Sets the test settings file, relative to the container's directory.
    pub fn set_test_settings(&mut self, test_settings: impl Into<String>) -> &mut Self {
        self.test_settings = Some(test_settings.into());
        self
    }

    /// Returns the path to the test container.
    pub fn container_path(&self) -> &Utf8Path {
        &self.container_path
    }

    /// Returns the runner kind.
    pub fn kind(&self) -> RunnerKind {
        self.kind
    }

    /// Returns the explicitly configured runner path, if any.
    pub fn runner_path(&self) -> Option<&Utf8Path> {
        self.runner_path.as_deref()
    }

    /// Returns the arguments appended to the runner's command line.
    pub fn additional_args(&self) -> &str {
        &self.additional_args
    }

    /// Returns true if the results directory is cleared before the runner is invoked.
    pub fn clear_results(&self) -> bool {
        self.clear_results
    }

    /// Returns the test settings file, if any. Empty values are treated as unset.
    pub fn test_settings(&self) -> Option<&str> {
        self.test_settings.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the directory containing the test container.
    ///
    /// The runner is invoked with this as its working directory.
    pub fn container_dir(&self) -> &Utf8Path {
        match self.container_path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        }
    }

    /// Returns the results directory: `<container dir>/TestResults`.
    pub fn results_dir(&self) -> Utf8PathBuf {
        self.container_dir().join(RESULTS_DIR_NAME)
    }
}
