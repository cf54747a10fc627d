// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running the test runner executable as a child process.

use crate::errors::RunnerExecError;
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, future::Future, process::Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

#[cfg(not(windows))]
#[path = "test_command/unix.rs"]
mod os;

#[cfg(windows)]
#[path = "test_command/windows.rs"]
mod os;

/// A to-be-run test runner command.
///
/// Arguments are stored the way they appear on a Windows command line, including quotes. The
/// additional arguments are an opaque string that is appended verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerCommand {
    program: Utf8PathBuf,
    cwd: Utf8PathBuf,
    args: Vec<String>,
    extra_args: String,
    // The argument line split into individual arguments, for platforms without raw arguments.
    #[cfg_attr(windows, allow(dead_code))]
    argv: Vec<String>,
}

impl RunnerCommand {
    /// Creates a new command.
    ///
    /// Returns an error if the arguments can't be split into an argument vector on this platform.
    pub fn new(
        program: impl Into<Utf8PathBuf>,
        cwd: impl Into<Utf8PathBuf>,
        args: Vec<String>,
        extra_args: impl Into<String>,
    ) -> Result<Self, shell_words::ParseError> {
        let mut command = Self {
            program: program.into(),
            cwd: cwd.into(),
            args,
            extra_args: extra_args.into().trim().to_owned(),
            argv: Vec::new(),
        };
        command.argv = os::split_args(&command.args_line())?;
        Ok(command)
    }

    /// Returns the program to run.
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Returns the working directory of the child process.
    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Returns the fixed arguments, before the additional arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the additional arguments.
    pub fn extra_args(&self) -> &str {
        &self.extra_args
    }

    /// Returns the full argument line, as passed to the runner.
    pub fn args_line(&self) -> String {
        let mut line = self.args.join(" ");
        if !self.extra_args.is_empty() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&self.extra_args);
        }
        line
    }

    /// Returns the full command line, for display.
    pub fn command_line(&self) -> String {
        let args_line = self.args_line();
        if args_line.is_empty() {
            format!("\"{}\"", self.program)
        } else {
            format!("\"{}\" {args_line}", self.program)
        }
    }

    fn to_std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.current_dir(&self.cwd);
        os::apply_args(&mut cmd, self);
        cmd
    }
}

/// The exit status of a test runner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunnerExitStatus {
    code: Option<i32>,
}

impl RunnerExitStatus {
    /// Creates a status for a process that exited with the given code.
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Creates a status for a process that was terminated without an exit code.
    pub fn terminated() -> Self {
        Self { code: None }
    }

    /// Returns the exit code, if the process exited normally.
    pub fn code(self) -> Option<i32> {
        self.code
    }

    /// Returns true if the process exited with code 0.
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for RunnerExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for RunnerExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "no exit code (terminated by a signal)"),
        }
    }
}

/// Runs test runner commands.
///
/// The runner's exit status is diagnostic only: the caller decides what to do with it.
pub trait ProcessExecutor {
    /// Runs the command to completion.
    fn execute(
        &self,
        command: &RunnerCommand,
    ) -> impl Future<Output = Result<RunnerExitStatus, RunnerExecError>>;
}

/// A [`ProcessExecutor`] that spawns a child process through tokio.
///
/// Standard output is forwarded line by line to `info` logs, and standard error to `warn` logs.
/// There is no timeout: a hung runner blocks until it exits.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioExecutor;

impl ProcessExecutor for TokioExecutor {
    async fn execute(&self, command: &RunnerCommand) -> Result<RunnerExitStatus, RunnerExecError> {
        let mut cmd = tokio::process::Command::from(command.to_std_command());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| RunnerExecError::new(command.command_line(), err))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout_res, stderr_res, status) = tokio::join!(
            forward_lines(stdout, OutputStream::Stdout),
            forward_lines(stderr, OutputStream::Stderr),
            child.wait(),
        );
        let status = status.map_err(|err| RunnerExecError::new(command.command_line(), err))?;

        for res in [stdout_res, stderr_res] {
            if let Err(err) = res {
                warn!("error reading runner output: {err}");
            }
        }

        Ok(status.into())
    }
}

#[derive(Copy, Clone, Debug)]
enum OutputStream {
    Stdout,
    Stderr,
}

async fn forward_lines<R: AsyncRead + Unpin>(
    reader: Option<R>,
    stream: OutputStream,
) -> std::io::Result<()> {
    let Some(reader) = reader else {
        return Ok(());
    };

    // The runner writes in the console code page, so don't insist on UTF-8.
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        match stream {
            OutputStream::Stdout => info!(target: "mstest_runner::output", "{line}"),
            OutputStream::Stderr => warn!(target: "mstest_runner::output", "{line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str], extra_args: &str) -> RunnerCommand {
        RunnerCommand::new(
            "C:/VS/vstest.console.exe",
            "C:/build",
            args.iter().map(|arg| (*arg).to_owned()).collect(),
            extra_args,
        )
        .expect("arguments are valid")
    }

    #[test]
    fn args_line() {
        assert_eq!(
            command(&["\"C:/build/a.dll\"", "/logger:trx"], "").args_line(),
            "\"C:/build/a.dll\" /logger:trx"
        );
        assert_eq!(
            command(&["\"C:/build/a.dll\"", "/logger:trx"], "  /Platform:x64 ").args_line(),
            "\"C:/build/a.dll\" /logger:trx /Platform:x64"
        );
        assert_eq!(command(&[], "/Platform:x64").args_line(), "/Platform:x64");
        assert_eq!(
            command(&["/nologo"], "").command_line(),
            "\"C:/VS/vstest.console.exe\" /nologo"
        );
    }

    #[test]
    fn exit_status() {
        assert!(RunnerExitStatus::from_code(0).success());
        assert!(!RunnerExitStatus::from_code(1).success());
        assert!(!RunnerExitStatus::terminated().success());
        assert_eq!(RunnerExitStatus::from_code(1).to_string(), "exit code 1");
    }

    #[cfg(not(windows))]
    #[test]
    fn argv_strips_wire_quoting() {
        let command = command(
            &["\"/build/My Tests/a.dll\"", "/logger:trx"],
            "/TestCaseFilter:\"Name=Foo Bar\"",
        );
        assert_eq!(
            command.argv,
            [
                "/build/My Tests/a.dll",
                "/logger:trx",
                "/TestCaseFilter:Name=Foo Bar",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tokio_executor_reports_exit_code() {
        let command = RunnerCommand::new("sh", ".", vec!["-c".to_owned(), "'exit 3'".to_owned()], "")
            .expect("arguments are valid");
        let status = TokioExecutor
            .execute(&command)
            .await
            .expect("sh can be spawned");
        assert_eq!(status.code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tokio_executor_spawn_failure() {
        let command = RunnerCommand::new("/nonexistent/vstest.console.exe", ".", Vec::new(), "")
            .expect("arguments are valid");
        let error = TokioExecutor
            .execute(&command)
            .await
            .expect_err("nonexistent program fails to spawn");
        assert_eq!(error.command(), "\"/nonexistent/vstest.console.exe\"");
    }
}
