// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::RunnerConfigurationError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{cmp::Ordering, sync::LazyLock};
use tracing::debug;

static VISUAL_STUDIO_DIR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Microsoft Visual Studio ([0-9]+(?:\.[0-9]+)?)$")
        .expect("Visual Studio directory regex is valid")
});

/// Finds `vstest.console.exe` inside Visual Studio installations.
///
/// Every directory directly under the search root named `Microsoft Visual Studio <version>` is a
/// candidate. Candidates are probed newest version first. Nothing is cached: each call to
/// [`locate`](Self::locate) scans the file system again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VsTestLocator {
    search_root: Option<Utf8PathBuf>,
}

impl VsTestLocator {
    /// The path to `vstest.console.exe` relative to a Visual Studio installation directory.
    pub const RELATIVE_PATH: &'static str =
        "Common7/IDE/CommonExtensions/Microsoft/TestWindow/vstest.console.exe";

    /// Environment variables consulted for the search root, in order.
    pub const SEARCH_ROOT_ENV_VARS: &'static [&'static str] = &["ProgramFiles(x86)", "ProgramFiles"];

    /// Creates a locator that searches the given directory.
    pub fn new(search_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            search_root: Some(search_root.into()),
        }
    }

    /// Creates a locator that searches the 32-bit program files directory, falling back to the
    /// native one.
    pub fn from_env() -> Self {
        let search_root = Self::SEARCH_ROOT_ENV_VARS.iter().find_map(|var| {
            // Non-UTF-8 values can't be represented as a search root, so skip them.
            std::env::var(var).ok().filter(|value| !value.is_empty())
        });
        Self {
            search_root: search_root.map(Utf8PathBuf::from),
        }
    }

    /// Returns the directory that is searched, if any.
    pub fn search_root(&self) -> Option<&Utf8Path> {
        self.search_root.as_deref()
    }

    /// Returns the Visual Studio installation directories under the search root, newest version
    /// first.
    ///
    /// Directories that can't be read are skipped.
    pub fn installations(&self) -> Vec<VisualStudioInstallation> {
        let Some(search_root) = &self.search_root else {
            return Vec::new();
        };

        let entries = match search_root.read_dir_utf8() {
            Ok(entries) => entries,
            Err(err) => {
                debug!("unable to list {search_root}: {err}");
                return Vec::new();
            }
        };

        let mut installations: Vec<_> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.file_type().ok()?.is_dir() {
                    return None;
                }
                VisualStudioInstallation::from_dir(entry.path())
            })
            .collect();
        installations.sort_by(|a, b| b.cmp_version(a));
        installations
    }

    /// Returns the path to the newest `vstest.console.exe` under the search root.
    pub fn locate(&self) -> Result<Utf8PathBuf, RunnerConfigurationError> {
        let Some(search_root) = &self.search_root else {
            return Err(RunnerConfigurationError::NoSearchRoot);
        };

        for installation in self.installations() {
            let candidate = installation.dir.join(Self::RELATIVE_PATH);
            debug!("probing {candidate}");
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(RunnerConfigurationError::NotDiscovered {
            search_root: search_root.clone(),
        })
    }
}

/// A directory that looks like a Visual Studio installation.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualStudioInstallation {
    /// The installation directory.
    pub dir: Utf8PathBuf,

    /// The version from the directory name, e.g. `14.0`.
    pub version: f64,
}

impl VisualStudioInstallation {
    /// Returns an installation if `dir` is named `Microsoft Visual Studio <version>`.
    pub fn from_dir(dir: &Utf8Path) -> Option<Self> {
        let captures = VISUAL_STUDIO_DIR_REGEX.captures(dir.file_name()?)?;
        let version = captures.get(1)?.as_str().parse().ok()?;
        Some(Self {
            dir: dir.to_path_buf(),
            version,
        })
    }

    fn cmp_version(&self, other: &Self) -> Ordering {
        self.version
            .total_cmp(&other.version)
            .then_with(|| self.dir.cmp(&other.dir))
    }
}
