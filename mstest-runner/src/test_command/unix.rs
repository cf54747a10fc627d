// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::RunnerCommand;

/// Splits the Windows-style argument line with POSIX shell rules, which strips the quoting.
pub(super) fn split_args(args_line: &str) -> Result<Vec<String>, shell_words::ParseError> {
    shell_words::split(args_line)
}

pub(super) fn apply_args(cmd: &mut std::process::Command, command: &RunnerCommand) {
    cmd.args(&command.argv);
}
