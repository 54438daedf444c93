use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_MAX_INSTANCES, DEFAULT_PRODID};
use crate::error::CoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub limiter: LimiterConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimiterConfig {
    /// Upper bound on occurrences produced by a single expansion.
    pub max_instances: usize,
    /// Zone used to resolve floating times against an absolute query window.
    pub floating_zone: Option<String>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_instances: DEFAULT_MAX_INSTANCES,
            floating_zone: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub prodid: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prodid: DEFAULT_PRODID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from the environment and an optional `config.toml`
    /// into a `Settings`. Environment variables take precedence over file values.
    ///
    /// Environment keys use the `CADENCE` prefix and `__` as the nesting
    /// separator, e.g. `CADENCE_LIMITER__MAX_INSTANCES=500`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it
    /// fails, or if `limiter.max_instances` is zero.
    pub fn load() -> Result<Self> {
        let max_instances = u64::try_from(DEFAULT_MAX_INSTANCES).unwrap_or(u64::MAX);

        let settings = Config::builder()
            .set_default("limiter.max_instances", max_instances)?
            .set_default("output.prodid", DEFAULT_PRODID)?
            .set_default("logging.level", "info")?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env overrides file
            .add_source(
                config::Environment::with_prefix("CADENCE")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.limiter.max_instances == 0 {
            return Err(CoreError::ConfigError(
                "limiter.max_instances must be at least 1".to_string(),
            )
            .into());
        }

        tracing::debug!(
            max_instances = settings.limiter.max_instances,
            floating_zone = ?settings.limiter.floating_zone,
            "Settings loaded"
        );

        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn load_applies_defaults() {
        let settings = Settings::load().expect("defaults should deserialize");

        assert!(settings.limiter.max_instances > 0);
        assert!(!settings.output.prodid.is_empty());
        assert!(!settings.logging.level.is_empty());
    }

    #[test]
    fn limiter_config_default() {
        let config = LimiterConfig::default();
        assert_eq!(config.max_instances, DEFAULT_MAX_INSTANCES);
        assert!(config.floating_zone.is_none());
    }

    #[test]
    fn output_config_default_prodid() {
        let config = OutputConfig::default();
        assert_eq!(config.prodid, "-//Cadence//Recurrence Limiter//EN");
    }
}
