// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::RunnerCommand;
use std::os::windows::process::CommandExt;

/// Arguments are passed through raw, so there's nothing to split.
pub(super) fn split_args(_args_line: &str) -> Result<Vec<String>, shell_words::ParseError> {
    Ok(Vec::new())
}

pub(super) fn apply_args(cmd: &mut std::process::Command, command: &RunnerCommand) {
    for arg in &command.args {
        cmd.raw_arg(arg);
    }
    if !command.extra_args.is_empty() {
        cmd.raw_arg(&command.extra_args);
    }
}
