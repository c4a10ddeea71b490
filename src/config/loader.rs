//! Configuration Loader
//!
//! Environment-aware layered loading built on the `config` crate:
//!
//! 1. Built-in defaults for the detected environment
//! 2. `<dir>/gangkeeper.toml` (optional)
//! 3. `<dir>/gangkeeper.<environment>.toml` (optional)
//! 4. `GANGKEEPER__SECTION__FIELD` environment variables

use super::error::{ConfigResult, ConfigurationError};
use super::GangkeeperConfig;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "GANGKEEPER";

/// Loads [`GangkeeperConfig`] from defaults, files and environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<GangkeeperConfig> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<GangkeeperConfig> {
        let environment = Self::detect_environment();
        let config_dir = config_dir.unwrap_or_else(Self::default_config_directory);
        Self::load_from_directory_with_env(&config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for testing without modifying the detected environment.
    pub fn load_from_directory_with_env(
        config_dir: &Path,
        environment: &str,
    ) -> ConfigResult<GangkeeperConfig> {
        debug!(
            environment = environment,
            config_dir = %config_dir.display(),
            "Loading configuration"
        );

        let defaults = GangkeeperConfig::for_environment(environment);
        let defaults_source = config::Config::try_from(&defaults)
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        let settings = config::Config::builder()
            .add_source(defaults_source)
            .add_source(config::File::from(config_dir.join("gangkeeper.toml")).required(false))
            .add_source(
                config::File::from(config_dir.join(format!("gangkeeper.{environment}.toml")))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        let config: GangkeeperConfig = settings.try_deserialize()?;
        config.validate()?;

        info!(
            environment = environment,
            cache_backend = %config.cache.backend,
            cache_enabled = config.cache.enabled,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Detect the current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("GANGKEEPER_ENV")
            .or_else(|_| env::var("RUST_ENV"))
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("GANGKEEPER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
