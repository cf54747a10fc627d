// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mstest_metadata::MsTestExitCode;
use mstest_runner::{
    config::MsTestConfig,
    errors::RecordError,
    outcome::{InconclusivePolicy, Outcomes},
    reporter::{
        DisplayRecorder, JsonRecorder, JunitRecorder, OutcomeRecorder, ReportContext,
        report_outcomes,
    },
    request::RunRequest,
    runner::{RunnerKind, TestRunner, VsTestLocator},
};
use std::io::Write;
use supports_color::Stream;
use tracing::{debug, info};

/// Runs MSTest and VSTest test containers, and reports normalized test outcomes.
#[derive(Debug, Parser)]
#[command(name = "mstest-run", version, styles = clap_styles::style())]
pub struct MsTestApp {
    /// Config file [default: .config/mstest.toml in the current directory]
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl MsTestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code on success.
    pub fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let cwd = current_dir()?;
        match self.command {
            Command::Run(opts) => {
                let config = MsTestConfig::from_sources(&cwd, self.config_file.as_deref())?;
                opts.exec(&cwd, &config, output, output_writer)
            }
            Command::Parse(opts) => {
                let config = MsTestConfig::from_sources(&cwd, self.config_file.as_deref())?;
                opts.exec(&cwd, &config, output, output_writer)
            }
            Command::Locate => exec_locate(output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the tests in a test container and report the outcomes
    Run(RunOpts),

    /// Report the outcomes in an existing result file, without running anything
    Parse(ParseOpts),

    /// Print the path to the newest installed vstest.console.exe
    Locate,
}

#[derive(Debug, Args)]
struct RunOpts {
    /// The test container (test assembly) to run
    #[arg(value_name = "CONTAINER")]
    container: Utf8PathBuf,

    #[command(flatten)]
    runner_opts: RunnerOpts,

    #[command(flatten)]
    report_opts: ReportOpts,
}

impl RunOpts {
    fn exec(
        self,
        cwd: &Utf8Path,
        config: &MsTestConfig,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let container = cwd.join(&self.container);
        let mut request = RunRequest::from_config(&container, config.runner());
        self.runner_opts
            .apply(&mut request, vstest_exe_path_from_env());
        debug!(
            "running {} with {} (config file: {})",
            request.container_path(),
            request.kind(),
            config.config_file(),
        );

        let mut runner = TestRunner::new();
        runner.set_inconclusive_policy(self.report_opts.inconclusive_policy(config));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| ExpectedError::TokioRuntimeCreateError { err })?;
        let outcomes = runtime.block_on(runner.execute(&request))?;

        self.report_opts
            .report(outcomes, &container, config, output, output_writer)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Runner options")]
struct RunnerOpts {
    /// Runner to invoke
    #[arg(long, value_enum, value_name = "KIND")]
    runner: Option<RunnerKindOpt>,

    /// Path to the runner executable [default: $VSTEST_EXE_PATH for vstest, or the
    /// auto-discovered vstest.console.exe]
    #[arg(long, value_name = "PATH")]
    runner_path: Option<Utf8PathBuf>,

    /// Clear the TestResults directory before running
    #[arg(long)]
    clear_results: bool,

    /// Additional arguments appended to the runner's command line
    #[arg(long = "args", value_name = "ARGS", allow_hyphen_values = true)]
    additional_args: Option<String>,

    /// Test settings file, relative to the container's directory (mstest only)
    #[arg(long, value_name = "FILE")]
    test_settings: Option<String>,
}

impl RunnerOpts {
    /// Applies these options to `request`.
    ///
    /// `vstest_exe_path` is only used when the effective runner is vstest and no
    /// `--runner-path` was given.
    fn apply(self, request: &mut RunRequest, vstest_exe_path: Option<Utf8PathBuf>) {
        if let Some(runner) = self.runner {
            request.set_kind(runner.into());
        }
        match (self.runner_path, vstest_exe_path) {
            (Some(runner_path), _) => {
                request.set_runner_path(runner_path);
            }
            (None, Some(vstest_exe_path)) if request.kind() == RunnerKind::VsTest => {
                debug!("using {VSTEST_EXE_PATH_ENV}={vstest_exe_path}");
                request.set_runner_path(vstest_exe_path);
            }
            _ => {}
        }
        if self.clear_results {
            request.set_clear_results(true);
        }
        if let Some(additional_args) = self.additional_args {
            request.set_additional_args(additional_args);
        }
        if let Some(test_settings) = self.test_settings {
            request.set_test_settings(test_settings);
        }
    }
}

#[derive(Debug, Args)]
struct ParseOpts {
    /// The result file to read
    #[arg(value_name = "RESULT_FILE")]
    result_file: Utf8PathBuf,

    /// Read the file as written by the legacy mstest.exe, including nested results
    #[arg(long)]
    legacy: bool,

    #[command(flatten)]
    report_opts: ReportOpts,
}

impl ParseOpts {
    fn exec(
        self,
        cwd: &Utf8Path,
        config: &MsTestConfig,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let result_file = cwd.join(&self.result_file);
        let kind = if self.legacy {
            RunnerKind::MsTest
        } else {
            RunnerKind::VsTest
        };

        let mut runner = TestRunner::new();
        runner.set_inconclusive_policy(self.report_opts.inconclusive_policy(config));
        let outcomes = runner.read_outcomes(&result_file, kind)?;

        self.report_opts
            .report(outcomes, &result_file, config, output, output_writer)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Reporter options")]
struct ReportOpts {
    /// Group label attached to every outcome [default: the file name without extension]
    #[arg(long, value_name = "GROUP")]
    group: Option<String>,

    /// How to treat inconclusive outcomes
    #[arg(long, value_enum, value_name = "POLICY")]
    inconclusive: Option<InconclusivePolicyOpt>,

    /// Also write outcomes as JUnit XML to this path
    #[arg(long, value_name = "PATH")]
    junit: Option<Utf8PathBuf>,

    /// Format for outcomes written to standard output
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,
}

impl ReportOpts {
    fn inconclusive_policy(&self, config: &MsTestConfig) -> InconclusivePolicy {
        self.inconclusive
            .map(InconclusivePolicy::from)
            .unwrap_or_else(|| config.report().inconclusive())
    }

    fn group(&self, config: &MsTestConfig, path: &Utf8Path) -> String {
        self.group
            .as_deref()
            .or_else(|| config.report().group())
            .or_else(|| path.file_stem())
            .unwrap_or_default()
            .to_owned()
    }

    fn report(
        self,
        outcomes: Outcomes,
        path: &Utf8Path,
        config: &MsTestConfig,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let cx = ReportContext::new(self.group(config, path));
        debug!("reporting outcomes for group {} (run {})", cx.group(), cx.run_id());

        let junit_path = self
            .junit
            .or_else(|| config.report().junit().path().map(Utf8Path::to_path_buf));
        let mut junit = junit_path.map(JunitRecorder::new);

        let stdout = output_writer.stdout_writer();
        let mut stdout_recorder: Box<dyn OutcomeRecorder + '_> = match self.message_format {
            MessageFormat::Human => {
                let mut recorder = DisplayRecorder::new(stdout);
                if output.color.should_colorize(Stream::Stdout) {
                    recorder.colorize();
                }
                Box::new(recorder)
            }
            MessageFormat::Json => Box::new(JsonRecorder::new(stdout)),
        };

        let mut recorders: Vec<&mut dyn OutcomeRecorder> = Vec::new();
        recorders.push(stdout_recorder.as_mut());
        if let Some(junit) = &mut junit {
            recorders.push(junit);
        }

        let summary = report_outcomes(outcomes, &cx, &mut recorders)?;
        if let Some(junit) = &junit {
            info!("wrote JUnit report to {}", junit.path());
        }

        if summary.is_success() {
            Ok(MsTestExitCode::OK)
        } else {
            Err(ExpectedError::test_run_failed(
                summary.failed,
                summary.total(),
            ))
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RunnerKindOpt {
    /// vstest.console.exe
    Vstest,
    /// Legacy mstest.exe
    Mstest,
}

impl From<RunnerKindOpt> for RunnerKind {
    fn from(opt: RunnerKindOpt) -> Self {
        match opt {
            RunnerKindOpt::Vstest => RunnerKind::VsTest,
            RunnerKindOpt::Mstest => RunnerKind::MsTest,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum InconclusivePolicyOpt {
    /// Report inconclusive outcomes
    Record,
    /// Log inconclusive outcomes without reporting them
    LogOnly,
}

impl From<InconclusivePolicyOpt> for InconclusivePolicy {
    fn from(opt: InconclusivePolicyOpt) -> Self {
        match opt {
            InconclusivePolicyOpt::Record => InconclusivePolicy::Record,
            InconclusivePolicyOpt::LogOnly => InconclusivePolicy::LogOnly,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormat {
    /// Human-readable output
    #[default]
    Human,
    /// One JSON object per outcome
    Json,
}

const VSTEST_EXE_PATH_ENV: &str = "VSTEST_EXE_PATH";

fn vstest_exe_path_from_env() -> Option<Utf8PathBuf> {
    std::env::var(VSTEST_EXE_PATH_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .map(Utf8PathBuf::from)
}

fn exec_locate(output_writer: &mut OutputWriter) -> Result<i32, ExpectedError> {
    let path = VsTestLocator::from_env().locate()?;
    let mut stdout = output_writer.stdout_writer();
    writeln!(stdout, "{path}")
        .and_then(|()| stdout.flush())
        .map_err(|err| ExpectedError::WriteOutputError {
            err: RecordError::Io(err),
        })?;
    Ok(MsTestExitCode::OK)
}

fn current_dir() -> Result<Utf8PathBuf, ExpectedError> {
    let cwd =
        std::env::current_dir().map_err(|err| ExpectedError::GetCurrentDirFailed { err })?;
    Utf8PathBuf::try_from(cwd).map_err(|err| ExpectedError::current_dir_invalid(err.into_path_buf()))
}
