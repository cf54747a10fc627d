// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [mstest-run](https://crates.io/crates/mstest-cli), a driver for the
//! MSTest and VSTest command-line test runners.
//!
//! A run goes through three stages:
//!
//! 1. [`runner::TestRunner`] resolves the runner executable, invokes it against a test container
//!    and locates the result document it leaves behind.
//! 2. [`outcome::Outcomes`] normalizes each `UnitTestResult` in that document into a
//!    [`outcome::TestOutcome`].
//! 3. [`reporter::report_outcomes`] hands the outcomes to one or more
//!    [`reporter::OutcomeRecorder`]s.
//!
//! For the binary, see the `mstest-cli` crate. Configuration lives in [`config`].

pub mod config;
pub mod errors;
pub mod outcome;
pub mod reporter;
pub mod request;
pub mod runner;
pub mod test_command;
