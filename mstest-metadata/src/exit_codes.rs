// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `mstest-run` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum MsTestExitCode {}

impl MsTestExitCode {
    /// No errors occurred and every recorded test passed or was inconclusive.
    pub const OK: i32 = 0;

    /// One or more recorded tests failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// The runner executable could not be spawned.
    pub const RUNNER_EXEC_FAILED: i32 = 101;

    /// A result document was found but does not have the expected shape.
    pub const MALFORMED_RESULT: i32 = 103;

    /// The runner exited without leaving a result document behind.
    pub const MISSING_OUTPUT: i32 = 104;

    /// Writing data to stdout, stderr or a report file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up an invocation: bad configuration,
    /// or a runner executable that is missing or could not be discovered.
    pub const SETUP_ERROR: i32 = 96;
}
