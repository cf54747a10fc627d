// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to machine-readable output produced by `mstest-run`.
//!
//! With `--message-format json`, `mstest-run` writes one [`OutcomeRecord`] per
//! line to standard output. Its exit codes are documented in
//! [`MsTestExitCode`].

mod exit_codes;
mod outcome;

pub use exit_codes::*;
pub use outcome::*;
