// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for mstest-run.
//!
//! Configuration is layered, from lowest to highest priority:
//!
//! 1. the defaults in [`MsTestConfig::DEFAULT_CONFIG`]
//! 2. `.config/mstest.toml` under the working root, or an explicitly provided file
//! 3. environment variables such as `MSTEST_RUNNER__PATH` or `MSTEST_REPORT__GROUP`
//!
//! Command-line options are applied on top of this by the caller.

use crate::{errors::ConfigParseError, outcome::InconclusivePolicy, runner::RunnerKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Trait for handling configuration warnings.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the tracing crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// Overall configuration for mstest-run.
#[derive(Clone, Debug)]
pub struct MsTestConfig {
    config_file: Utf8PathBuf,
    runner: RunnerConfig,
    report: ReportConfig,
}

impl MsTestConfig {
    /// The default location of the config within the working root: `.config/mstest.toml`.
    pub const CONFIG_PATH: &'static str = ".config/mstest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Environment configuration uses this prefix, plus a _.
    pub const ENVIRONMENT_PREFIX: &'static str = "MSTEST";

    /// Nested keys in environment variables are separated by this string.
    pub const ENVIRONMENT_SEPARATOR: &'static str = "__";

    /// Reads the config from the given file, or if not specified from `.config/mstest.toml` in
    /// `root`, then applies `MSTEST_` environment variables on top.
    ///
    /// An explicitly specified file must exist. If no file is specified and `root` doesn't have
    /// `.config/mstest.toml`, the default config options are used.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(
            root,
            config_file,
            std::env::vars(),
            &mut DefaultConfigWarnings,
        )
    }

    /// Returns the default configuration, with no files or environment variables applied.
    pub fn default_config() -> Result<Self, ConfigParseError> {
        let (inner, _) = Self::build_and_deserialize_config(&Self::make_default_config())
            .map_err(|err| ConfigParseError::new("<default config>", err))?;
        Ok(Self::from_deserialized("<default config>".into(), inner))
    }

    /// Returns the config file that was read, or would have been read if it existed.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the runner configuration.
    pub fn runner(&self) -> &RunnerConfig {
        &self.runner
    }

    /// Returns the report configuration.
    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    // ---
    // Helper methods
    // ---

    /// Converts `MSTEST_RUNNER__CLEAR_RESULTS=true` into `("runner.clear-results", "true")`.
    ///
    /// Variables without the prefix are skipped, as are variables like `MSTEST_LOG` that don't
    /// name a nested key.
    fn environment_overrides(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Vec<(String, String)> {
        vars.into_iter()
            .filter_map(|(name, value)| {
                let rest = name
                    .strip_prefix(Self::ENVIRONMENT_PREFIX)?
                    .strip_prefix('_')?;
                if !rest.contains(Self::ENVIRONMENT_SEPARATOR) {
                    return None;
                }
                let key = rest
                    .split(Self::ENVIRONMENT_SEPARATOR)
                    .map(|segment| segment.to_ascii_lowercase().replace('_', "-"))
                    .collect::<Vec<_>>()
                    .join(".");
                Some((key, value))
            })
            .collect()
    }

    fn from_sources_impl(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
        env_vars: impl IntoIterator<Item = (String, String)>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        // Build the file on its own first, so that unknown keys are attributed to the file.
        let file_builder = Self::make_default_config().add_source(source);
        let (_, unknown) = Self::build_and_deserialize_config(&file_builder)
            .map_err(|err| ConfigParseError::new(&config_file, err))?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &unknown);
        }

        let mut composite_builder = file_builder;
        for (key, value) in Self::environment_overrides(env_vars) {
            composite_builder = composite_builder
                .set_override(key.as_str(), value)
                .map_err(|err| ConfigParseError::new(&config_file, err))?;
        }
        let (inner, _unknown) = Self::build_and_deserialize_config(&composite_builder)
            .map_err(|err| ConfigParseError::new(&config_file, err))?;

        Ok(Self::from_deserialized(config_file, inner))
    }

    fn from_deserialized(config_file: Utf8PathBuf, inner: MsTestConfigDeserialize) -> Self {
        Self {
            config_file,
            runner: inner.runner,
            report: inner.report,
        }
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(MsTestConfigDeserialize, BTreeSet<String>), ConfigError> {
        let config = builder.build_cloned()?;

        let mut ignored = BTreeSet::new();
        let config: MsTestConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                ignored.insert(path.to_string());
            })?;

        Ok((config, ignored))
    }
}

/// Configuration for invoking the test runner.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunnerConfig {
    kind: RunnerKind,
    #[serde(default)]
    path: Option<Utf8PathBuf>,
    clear_results: bool,
    additional_args: String,
    #[serde(default)]
    test_settings: Option<String>,
}

impl RunnerConfig {
    /// Returns the runner kind.
    pub fn kind(&self) -> RunnerKind {
        self.kind
    }

    /// Returns the explicitly configured runner path, if any.
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Returns true if the results directory should be cleared before running.
    pub fn clear_results(&self) -> bool {
        self.clear_results
    }

    /// Returns the arguments appended to the runner's command line.
    pub fn additional_args(&self) -> &str {
        &self.additional_args
    }

    /// Returns the test settings file, relative to the container's directory.
    pub fn test_settings(&self) -> Option<&str> {
        self.test_settings.as_deref()
    }
}

/// Configuration for reporting outcomes.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    #[serde(default)]
    group: Option<String>,
    inconclusive: InconclusivePolicy,
    #[serde(default)]
    junit: JunitConfig,
}

impl ReportConfig {
    /// Returns the group label, if configured.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the policy for inconclusive outcomes.
    pub fn inconclusive(&self) -> InconclusivePolicy {
        self.inconclusive
    }

    /// Returns the JUnit report configuration.
    pub fn junit(&self) -> &JunitConfig {
        &self.junit
    }
}

/// Configuration for the JUnit XML report.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JunitConfig {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
}

impl JunitConfig {
    /// Returns the path to write the report to, if configured.
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MsTestConfigDeserialize {
    runner: RunnerConfig,
    report: ReportConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;

    #[derive(Default)]
    struct CollectWarnings {
        unknown: Vec<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl ConfigWarnings for CollectWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown.push((config_file.to_owned(), unknown.clone()));
        }
    }

    fn temp_root(config_contents: Option<&str>) -> Utf8TempDir {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        if let Some(contents) = config_contents {
            let config_path = dir.path().join(MsTestConfig::CONFIG_PATH);
            std::fs::create_dir_all(config_path.parent().expect("has parent"))
                .expect("created .config");
            std::fs::write(&config_path, contents).expect("wrote config");
        }
        dir
    }

    fn env(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let config = MsTestConfig::default_config().expect("default config is always valid");
        assert_eq!(config.runner().kind(), RunnerKind::VsTest);
        assert_eq!(config.runner().path(), None);
        assert!(!config.runner().clear_results());
        assert_eq!(config.runner().additional_args(), "");
        assert_eq!(config.runner().test_settings(), None);
        assert_eq!(config.report().group(), None);
        assert_eq!(config.report().inconclusive(), InconclusivePolicy::Record);
        assert_eq!(config.report().junit().path(), None);

        // The default config must not contain unknown keys, since it's shipped with the binary.
        let (_, unknown) =
            MsTestConfig::build_and_deserialize_config(&MsTestConfig::make_default_config())
                .expect("default config is always valid");
        assert!(unknown.is_empty(), "unknown keys in default config: {unknown:?}");
    }

    #[test]
    fn environment_keys() {
        let overrides = MsTestConfig::environment_overrides(env(&[
            ("MSTEST_RUNNER__CLEAR_RESULTS", "true"),
            ("MSTEST_REPORT__JUNIT__PATH", "junit.xml"),
            ("MSTEST_LOG", "debug"),
            ("MSTEST_", "x"),
            ("MSTESTX_RUNNER__KIND", "mstest"),
            ("VSTEST_EXE_PATH", "vstest.console.exe"),
        ]));
        assert_eq!(
            overrides,
            env(&[
                ("runner.clear-results", "true"),
                ("report.junit.path", "junit.xml"),
            ])
        );
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let root = temp_root(None);
        let mut warnings = CollectWarnings::default();
        let config =
            MsTestConfig::from_sources_impl(root.path(), None, env(&[]), &mut warnings)
                .expect("defaults are valid");
        assert_eq!(config.config_file(), root.path().join(".config/mstest.toml"));
        assert_eq!(config.runner().kind(), RunnerKind::VsTest);
        assert!(warnings.unknown.is_empty());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let root = temp_root(Some(indoc! {r#"
            [runner]
            kind = "mstest"
            path = "C:/VS/Common7/IDE/mstest.exe"
            clear-results = true
            additional-args = "/category:Unit"
            test-settings = "Local.testsettings"

            [report]
            group = "Unit Tests"
            inconclusive = "log-only"
            junit.path = "out/junit.xml"
        "#}));
        let mut warnings = CollectWarnings::default();
        let config =
            MsTestConfig::from_sources_impl(root.path(), None, env(&[]), &mut warnings)
                .expect("config is valid");

        let runner = config.runner();
        assert_eq!(runner.kind(), RunnerKind::MsTest);
        assert_eq!(runner.path(), Some(Utf8Path::new("C:/VS/Common7/IDE/mstest.exe")));
        assert!(runner.clear_results());
        assert_eq!(runner.additional_args(), "/category:Unit");
        assert_eq!(runner.test_settings(), Some("Local.testsettings"));

        let report = config.report();
        assert_eq!(report.group(), Some("Unit Tests"));
        assert_eq!(report.inconclusive(), InconclusivePolicy::LogOnly);
        assert_eq!(report.junit().path(), Some(Utf8Path::new("out/junit.xml")));
        assert!(warnings.unknown.is_empty());
    }

    #[test]
    fn environment_overrides_config_file() {
        let root = temp_root(Some(indoc! {r#"
            [runner]
            path = "C:/from-file/vstest.console.exe"
        "#}));
        let mut warnings = CollectWarnings::default();
        let config = MsTestConfig::from_sources_impl(
            root.path(),
            None,
            env(&[
                ("MSTEST_RUNNER__PATH", "C:/from-env/vstest.console.exe"),
                ("MSTEST_RUNNER__CLEAR_RESULTS", "true"),
                ("MSTEST_REPORT__GROUP", "Nightly"),
                ("MSTEST_LOG", "debug"),
            ]),
            &mut warnings,
        )
        .expect("config is valid");

        assert_eq!(
            config.runner().path(),
            Some(Utf8Path::new("C:/from-env/vstest.console.exe"))
        );
        assert!(config.runner().clear_results());
        assert_eq!(config.report().group(), Some("Nightly"));
        assert!(warnings.unknown.is_empty());
    }

    #[test]
    fn unknown_keys_are_reported() {
        let root = temp_root(Some(indoc! {r#"
            [runner]
            kind = "vstest"
            timeout = 30

            [reporting]
            group = "x"
        "#}));
        let mut warnings = CollectWarnings::default();
        MsTestConfig::from_sources_impl(root.path(), None, env(&[]), &mut warnings)
            .expect("unknown keys are not fatal");

        assert_eq!(warnings.unknown.len(), 1);
        let (file, keys) = &warnings.unknown[0];
        assert_eq!(file, &root.path().join(".config/mstest.toml"));
        assert_eq!(
            keys.iter().map(String::as_str).collect::<Vec<_>>(),
            ["reporting", "runner.timeout"]
        );
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let root = temp_root(None);
        let missing = root.path().join("missing.toml");
        let error = MsTestConfig::from_sources_impl(
            root.path(),
            Some(&missing),
            env(&[]),
            &mut CollectWarnings::default(),
        )
        .expect_err("missing explicit config file is an error");
        assert_eq!(error.config_file(), &missing);
    }

    #[test]
    fn invalid_values_are_errors() {
        let root = temp_root(Some(indoc! {r#"
            [runner]
            kind = "nunit"
        "#}));
        let error = MsTestConfig::from_sources_impl(
            root.path(),
            None,
            env(&[]),
            &mut CollectWarnings::default(),
        )
        .expect_err("unknown runner kind is an error");
        assert_eq!(error.config_file(), &root.path().join(".config/mstest.toml"));
    }
}
