//! Configuration manager implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    types::AppConfig,
};

/// Environment prefix for overrides, e.g. `FORMSMITH__PATHS__OUTPUT_ROOT`
pub const ENV_PREFIX: &str = "FORMSMITH";

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "FORMSMITH_CONFIG";

/// Configuration manager
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Create with custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Path of the configuration file this manager reads
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get default config path
    fn default_config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./workdir/formsmith.toml"))
    }

    /// Load configuration from the file (if present) and the environment
    pub fn load_config(&self) -> Result<AppConfig> {
        debug!("Loading configuration from {}", self.config_path.display());

        let builder = Config::builder()
            .add_source(
                File::from(self.config_path.clone())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(&self.env_prefix).separator("__"));

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        self.validate_config(&app_config)?;
        Ok(app_config)
    }

    /// Write configuration as TOML to the manager's path
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }

    /// Check the invariants the pipeline relies on
    pub fn validate_config(&self, config: &AppConfig) -> Result<()> {
        let blank = config.schema.blank_entries();
        if !blank.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Schema field names must not be blank: {}",
                blank.join(", ")
            )));
        }

        let business = &config.business;
        if business.placeholder_item_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Placeholder item type must not be blank".to_string(),
            ));
        }
        if business.combined_item_types.is_empty() {
            return Err(ConfigError::Validation(
                "At least one combined item type is required".to_string(),
            ));
        }
        if business.is_combined(&business.placeholder_item_type) {
            return Err(ConfigError::Validation(format!(
                "Item type {} cannot be both placeholder and combined",
                business.placeholder_item_type
            )));
        }
        if business.placeholder_quote == business.format_separator {
            return Err(ConfigError::Validation(
                "Placeholder quote and format separator must differ".to_string(),
            ));
        }
        if business.amount_in_words_jurisdiction.chars().count() != 2 {
            return Err(ConfigError::Validation(format!(
                "Jurisdiction codes are two letters, got {:?}",
                business.amount_in_words_jurisdiction
            )));
        }
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
