// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs MSTest and VSTest test containers, and reports normalized test outcomes.
//!
//! This crate contains the command-line interface for `mstest-run`. The core logic lives in
//! [`mstest_runner`], and the machine-readable output format in [`mstest_metadata`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
