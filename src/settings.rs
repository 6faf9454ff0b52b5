//! Layered host settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, `FDBWATCH_*` environment variables, command-line flags.
//!
//! ```toml
//! interval = "30s"
//! timeout = "10s"
//! format = "json"
//!
//! [instance]
//! cluster_file = "/etc/foundationdb/fdb.cluster"
//! tags = ["env:prod", "team:storage"]
//! ```
//!
//! Nested keys use a double underscore in the environment, for example
//! `FDBWATCH_INSTANCE__CLUSTER_FILE`. Values are read as strings; list keys
//! (`instance.tags`, `instance.base_command`) accept comma separated values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use fdbwatch_check::{FileSource, FoundationdbCheck, InstanceConfig, DEFAULT_NAMESPACE};
use serde::Deserialize;

use crate::duration::parse_duration;
use crate::output::OutputFormat;

pub const ENV_PREFIX: &str = "FDBWATCH";
pub const DEFAULT_INTERVAL: &str = "15s";

/// Fully resolved settings for one `fdbwatch` run.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Time between polls
    pub interval: String,
    /// Bound on a single `fdbcli` run
    pub timeout: Option<String>,
    pub namespace: String,
    pub format: OutputFormat,
    /// Append records here instead of stdout
    pub output: Option<PathBuf>,
    /// Replay a saved `status json` document instead of running `fdbcli`
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub instance: InstanceConfig,
}

/// Values given on the command line, applied over every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub cluster_file: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
}

impl Settings {
    /// Load settings from all sources.
    pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        Self::load_with_env(path, overrides, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(
        path: Option<&Path>,
        overrides: &CliOverrides,
        environment: Environment,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("interval", DEFAULT_INTERVAL)?
            .set_default("namespace", DEFAULT_NAMESPACE)?
            .set_default("format", OutputFormat::default().as_str())?;

        if let Some(path) = path {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        let path_string = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        let config = builder
            .add_source(
                environment.prefix_separator("_").separator("__"),
            )
            .set_override_option("interval", overrides.interval.clone())?
            .set_override_option("timeout", overrides.timeout.clone())?
            .set_override_option("instance.cluster_file", path_string(&overrides.cluster_file))?
            .set_override_option("input", path_string(&overrides.input))?
            .set_override_option("format", overrides.format.map(|f| f.as_str()))?
            .set_override_option("output", path_string(&overrides.output))?
            .build()
            .context("Failed to load configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.interval()?.is_zero() {
            bail!("interval must be greater than zero");
        }
        self.timeout()?;
        Ok(())
    }

    pub fn interval(&self) -> Result<Duration> {
        parse_duration(&self.interval).with_context(|| format!("Invalid interval: {}", self.interval))
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|timeout| {
                parse_duration(timeout).with_context(|| format!("Invalid timeout: {timeout}"))
            })
            .transpose()
    }

    /// Build the check these settings describe.
    pub fn build_check(&self) -> Result<FoundationdbCheck> {
        let mut builder = FoundationdbCheck::builder()
            .instance(self.instance.clone())
            .namespace(self.namespace.clone());

        if let Some(timeout) = self.timeout()? {
            builder = builder.timeout(timeout);
        }
        if let Some(input) = &self.input {
            builder = builder.source(FileSource::new(input));
        }

        builder.build().context("Invalid instance configuration")
    }
}
