// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoking the test runner.
//!
//! The main structure in this module is [`TestRunner`]. The two runner generations it can drive
//! are described by [`RunnerKind`].

mod discovery;
mod imp;
mod kind;
mod results;

pub use discovery::*;
pub use imp::*;
pub use kind::*;
pub use results::find_newest_result;
