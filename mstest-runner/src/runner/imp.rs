// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    VsTestLocator,
    results::{clear_results_dir, read_result_file, remove_stale_file},
};
use crate::{
    errors::{RunError, RunnerConfigurationError},
    outcome::{InconclusivePolicy, Outcomes},
    request::RunRequest,
    runner::{ResultLocation, RunnerKind},
    test_command::{ProcessExecutor, TokioExecutor},
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

/// Runs the tests in a container and normalizes the results.
///
/// Each call to [`execute`](Self::execute) is independent: the runner path is resolved again,
/// the runner is invoked once, and exactly one result document is read. Nothing is retried.
#[derive(Clone, Debug)]
pub struct TestRunner<E = TokioExecutor> {
    executor: E,
    locator: VsTestLocator,
    inconclusive: InconclusivePolicy,
}

impl TestRunner {
    /// Creates a new runner that spawns child processes through tokio and locates
    /// `vstest.console.exe` under the program files directory.
    pub fn new() -> Self {
        Self::with_executor(TokioExecutor)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ProcessExecutor> TestRunner<E> {
    /// Creates a new runner with the given executor.
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            locator: VsTestLocator::from_env(),
            inconclusive: InconclusivePolicy::default(),
        }
    }

    /// Sets the locator used when a request has no explicit runner path.
    pub fn set_locator(&mut self, locator: VsTestLocator) -> &mut Self {
        self.locator = locator;
        self
    }

    /// Sets the policy for inconclusive outcomes.
    pub fn set_inconclusive_policy(&mut self, inconclusive: InconclusivePolicy) -> &mut Self {
        self.inconclusive = inconclusive;
        self
    }

    /// Returns the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Resolves the runner executable for a request.
    ///
    /// An explicit path must point to an existing file. Without one, `vstest.console.exe` is
    /// auto-discovered; `mstest.exe` can't be.
    pub fn resolve_runner_path(
        &self,
        request: &RunRequest,
    ) -> Result<Utf8PathBuf, RunnerConfigurationError> {
        match request.runner_path() {
            Some(path) => {
                if path.is_file() {
                    Ok(path.to_path_buf())
                } else {
                    Err(RunnerConfigurationError::NotFound {
                        path: path.to_path_buf(),
                    })
                }
            }
            None if request.kind().supports_discovery() => {
                debug!(
                    "no runner path set, searching for {} under {:?}",
                    request.kind().executable_name(),
                    self.locator.search_root(),
                );
                self.locator.locate()
            }
            None => Err(RunnerConfigurationError::PathRequired {
                kind: request.kind(),
            }),
        }
    }

    /// Runs the tests in the request's container and returns the normalized outcomes.
    ///
    /// A non-zero exit code from the runner is logged, but isn't an error by itself: runners
    /// exit non-zero when tests fail. Success is decided by whether a result document was
    /// produced.
    pub async fn execute(&self, request: &RunRequest) -> Result<Outcomes, RunError> {
        let runner_path = self.resolve_runner_path(request)?;
        info!("using {} at {runner_path}", request.kind().executable_name());

        let kind = request.kind();
        let command = kind.build_command(&runner_path, request)?;
        let location = kind.result_location(request);

        if request.clear_results() {
            let results_dir = request.results_dir();
            info!("clearing {results_dir}");
            clear_results_dir(&results_dir)?;
        }
        if let ResultLocation::Fixed { path } = &location {
            // mstest.exe refuses to overwrite an existing results file.
            remove_stale_file(path)?;
        }

        info!("executing {}", command.command_line());
        let status = self.executor.execute(&command).await?;
        if !status.success() {
            warn!(
                "{} exited with {status}, looking for results anyway",
                kind.executable_name(),
            );
        }

        let result_file = location.resolve()?;
        self.read_outcomes(&result_file, kind)
    }

    /// Normalizes an existing result document, without running anything.
    pub fn read_outcomes(&self, result_file: &Utf8Path, kind: RunnerKind) -> Result<Outcomes, RunError> {
        info!("reading results from {result_file}");
        let test_run = read_result_file(result_file, kind.results_scope())?;
        debug!(
            "read {} results from run {}",
            test_run.results.len(),
            test_run.name.as_deref().unwrap_or("(unnamed)"),
        );
        Ok(Outcomes::new(test_run, self.inconclusive))
    }
}
