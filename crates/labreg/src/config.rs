//! Configuration management for labreg.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::academic::DEFAULT_YEAR_CUTOFF_DAY;
use crate::error::{Error, Result};
use crate::privacy::DEFAULT_MASK_FIELDS;
use crate::session::{default_dev_users, AuthMode, DevUser};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "labreg";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "labregister.sqlite";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "LABREG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LABREG_`)
/// 2. TOML config file at `~/.config/labreg/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Permission matrix configuration.
    pub permissions: PermissionsConfig,
    /// Registration rules.
    pub registration: RegistrationConfig,
    /// Privacy configuration.
    pub privacy: PrivacyConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/labreg/labregister.sqlite`
    pub database_path: Option<PathBuf>,
}

/// Authentication configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// `cas` in production, `dev` for local fake logins.
    pub mode: AuthMode,
    /// Fake users available in `dev` mode, by username.
    pub dev_users: BTreeMap<String, DevUser>,
}

/// Permission matrix configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Custom matrix file. The embedded matrix is used when unset.
    pub matrix_path: Option<PathBuf>,
}

/// Registration rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Day of year on which the academic year rolls over.
    pub academic_year_cutoff_day: u32,
}

/// Privacy-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Record fields masked in displayed output.
    pub mask_fields: Vec<String>,
    /// Redact personal data in audit entries.
    pub redact_audit: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Cas,
            dev_users: default_dev_users(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            academic_year_cutoff_day: DEFAULT_YEAR_CUTOFF_DAY,
        }
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            mask_fields: DEFAULT_MASK_FIELDS.iter().map(ToString::to_string).collect(),
            redact_audit: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let config: Config = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The layered provider chain: defaults, then the file, then the environment.
    #[must_use]
    pub fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let cutoff = self.registration.academic_year_cutoff_day;
        if !(1..=366).contains(&cutoff) {
            return Err(Error::ConfigValidation {
                message: format!("academic_year_cutoff_day ({cutoff}) must be between 1 and 366"),
            });
        }

        if self.privacy.mask_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: "mask_fields must not contain empty names".to_string(),
            });
        }

        if self.auth.mode == AuthMode::Dev && self.auth.dev_users.is_empty() {
            return Err(Error::ConfigValidation {
                message: "auth mode is dev but no dev_users are configured".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
