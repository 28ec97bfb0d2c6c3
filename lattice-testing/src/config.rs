//! Configuration for rendering, queries and cleanup.
//!
//! [`Config::load`] layers three sources with the `config` crate: the
//! field defaults, the JSON file named by `LATTICE_TESTING_CONFIG` (if any),
//! then environment variables:
//!
//! | Variable                    | Field               |
//! |-----------------------------|---------------------|
//! | `LATTICE_SKIP_AUTO_CLEANUP` | `skip_auto_cleanup` |
//! | `LATTICE_TEST_ID_ATTRIBUTE` | `test_id_attribute` |
//! | `LATTICE_ASYNC_TIMEOUT_MS`  | `async_timeout_ms`  |
//! | `LATTICE_POLL_INTERVAL_MS`  | `poll_interval_ms`  |
//! | `DEBUG_PRINT_LIMIT`         | `debug_print_limit` |
//!
//! Empty variables are ignored.

use std::path::Path;
use std::time::Duration;

use config::{Environment, File, FileFormat, Map};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

pub const CONFIG_PATH_VAR: &str = "LATTICE_TESTING_CONFIG";
pub const ENV_PREFIX: &str = "LATTICE";
pub const SKIP_AUTO_CLEANUP_VAR: &str = "LATTICE_SKIP_AUTO_CLEANUP";
pub const TEST_ID_ATTRIBUTE_VAR: &str = "LATTICE_TEST_ID_ATTRIBUTE";
pub const ASYNC_TIMEOUT_VAR: &str = "LATTICE_ASYNC_TIMEOUT_MS";
pub const DEBUG_PRINT_LIMIT_VAR: &str = "DEBUG_PRINT_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Do not sweep the session after each test.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub skip_auto_cleanup: bool,
    /// Attribute matched by the `*_by_test_id` queries.
    #[serde(default = "default_test_id_attribute")]
    pub test_id_attribute: String,
    /// How long `find_*` and `wait_for` keep polling.
    #[serde(default = "default_async_timeout_ms")]
    pub async_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum length of markup printed by `debug` and query errors.
    #[serde(default = "default_debug_print_limit")]
    pub debug_print_limit: usize,
}

fn default_test_id_attribute() -> String {
    "data-testid".to_string()
}

fn default_async_timeout_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_debug_print_limit() -> usize {
    7000
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Built-in defaults, without reading the file system or environment.
    pub fn defaults() -> Self {
        Self {
            skip_auto_cleanup: false,
            test_id_attribute: default_test_id_attribute(),
            async_timeout_ms: default_async_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            debug_print_limit: default_debug_print_limit(),
        }
    }

    /// Load the configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::vars().collect())
    }

    /// Load the configuration with `vars` standing in for the environment.
    pub fn load_from(vars: Map<String, String>) -> Result<Self, ConfigError> {
        let path = vars.get(CONFIG_PATH_VAR).filter(|p| !p.is_empty()).cloned();
        let print_limit = vars
            .get(DEBUG_PRINT_LIMIT_VAR)
            .filter(|v| !v.is_empty())
            .cloned();

        let mut builder = config::Config::builder();
        if let Some(path) = &path {
            builder = builder.add_source(
                File::from(Path::new(path))
                    .format(FileFormat::Json)
                    .required(false),
            );
        }
        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(Some(vars)),
            )
            .set_override_option("debug_print_limit", print_limit)?
            .build()?
            .try_deserialize()?;

        tracing::debug!(?config, ?path, "loaded testing config");
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn async_timeout(&self) -> Duration {
        Duration::from_millis(self.async_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Accepts a JSON bool or a flag string from the environment.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Text(text) => is_truthy(&text),
    })
}

/// A set flag is any non-empty value other than `0` or `false`.
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
