// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read TRX test result documents in Rust.
//!
//! TRX is the XML format written by `vstest.console.exe /logger:trx` and by
//! `mstest.exe /resultsfile:`. This crate reads the subset of the format that
//! describes per-test outcomes:
//!
//! ```text
//! TestRun
//! └── Results
//!     └── UnitTestResult (testName, outcome, startTime, endTime, duration)
//!         └── Output
//!             ├── StdOut
//!             └── ErrorInfo
//!                 ├── Message
//!                 └── StackTrace
//! ```
//!
//! Element and attribute names are matched as written in the document. The
//! namespace that TRX files declare is never resolved.

mod errors;
mod read;
mod report;

pub use errors::*;
pub use read::ResultsScope;
pub use report::*;
