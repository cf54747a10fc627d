// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Results directory handling.
//!
//! The results directory is shared with the runner and isn't locked: concurrent invocations
//! against the same container directory race with each other.

use crate::errors::{
    MalformedResultError, MissingOutputError, ResultsDirAction, ResultsDirError, RunError,
};
use crate::runner::ResultLocation;
use camino::{Utf8Path, Utf8PathBuf};
use quick_trx::{ResultsScope, TestRun};
use std::{fs::File, io, io::BufReader, time::SystemTime};
use tracing::debug;

/// Removes everything inside `dir`, keeping the directory itself.
///
/// Does nothing if the directory doesn't exist.
pub(crate) fn clear_results_dir(dir: &Utf8Path) -> Result<(), ResultsDirError> {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("results directory {dir} does not exist, nothing to clear");
            return Ok(());
        }
        Err(err) => return Err(ResultsDirError::new(ResultsDirAction::Clearing, dir, err)),
    };

    for entry in entries {
        let entry = entry.map_err(|err| ResultsDirError::new(ResultsDirAction::Clearing, dir, err))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|err| ResultsDirError::new(ResultsDirAction::Removing, path, err))?;
        let res = if file_type.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        res.map_err(|err| ResultsDirError::new(ResultsDirAction::Removing, path, err))?;
    }

    Ok(())
}

/// Removes a single file if it exists.
pub(crate) fn remove_stale_file(path: &Utf8Path) -> Result<(), ResultsDirError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("removed stale result file {path}");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ResultsDirError::new(ResultsDirAction::Removing, path, err)),
    }
}

/// Returns the most recently modified file in `dir` with the given extension, compared
/// case-insensitively.
///
/// If several files share the newest modification time, the one with the greatest file name is
/// returned.
pub fn find_newest_result(dir: &Utf8Path, extension: &'static str) -> Result<Utf8PathBuf, RunError> {
    if !dir.is_dir() {
        return Err(MissingOutputError::ResultsDirNotFound {
            dir: dir.to_path_buf(),
        }
        .into());
    }

    let entries = dir
        .read_dir_utf8()
        .map_err(|err| ResultsDirError::new(ResultsDirAction::Listing, dir, err))?;

    let mut newest: Option<(SystemTime, Utf8PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|err| ResultsDirError::new(ResultsDirAction::Listing, dir, err))?;
        let path = entry.path();
        let has_extension = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !has_extension {
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|err| ResultsDirError::new(ResultsDirAction::Listing, path, err))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map_err(|err| ResultsDirError::new(ResultsDirAction::Listing, path, err))?;

        let candidate = (modified, path.to_path_buf());
        if newest.as_ref().is_none_or(|current| candidate > *current) {
            newest = Some(candidate);
        }
    }

    match newest {
        Some((_, path)) => Ok(path),
        None => Err(MissingOutputError::NoResultFiles {
            dir: dir.to_path_buf(),
            extension,
        }
        .into()),
    }
}

impl ResultLocation {
    /// Returns the result document at this location, after the runner has exited.
    pub fn resolve(&self) -> Result<Utf8PathBuf, RunError> {
        match self {
            ResultLocation::Newest { dir, extension } => find_newest_result(dir, *extension),
            ResultLocation::Fixed { path } => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(MissingOutputError::ResultFileNotFound { path: path.clone() }.into())
                }
            }
        }
    }
}

/// Reads and parses a result document. Parsing is all-or-nothing.
pub(crate) fn read_result_file(path: &Utf8Path, scope: ResultsScope) -> Result<TestRun, RunError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(MissingOutputError::ResultFileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(err) => return Err(ResultsDirError::new(ResultsDirAction::Reading, path, err).into()),
    };

    let test_run = TestRun::from_reader(BufReader::new(file), scope)
        .map_err(|err| MalformedResultError::new(path, err))?;
    Ok(test_run)
}
