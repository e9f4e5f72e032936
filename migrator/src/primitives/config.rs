use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global configuration for the migrator
static CONFIG_INSTANCE: OnceLock<MigrationConfig> = OnceLock::new();

/// When the skip-check treats migration as already done.
///
/// The entry count is a heuristic: any existing data in the target engine means the migration
/// already ran, or the target already has first-run data of its own that must not be overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum SkipThreshold {
    /// Skip as soon as the storage holds at least one entry.
    #[default]
    AnyEntry,
    /// Skip only when the storage holds more than one entry, tolerating a single leftover
    /// init marker from an earlier attempt.
    MoreThanOne,
}

impl SkipThreshold {
    /// Whether `entries` stored items mean the migration can be skipped.
    #[must_use]
    pub const fn is_met(self, entries: u64) -> bool {
        match self {
            Self::AnyEntry => entries > 0,
            Self::MoreThanOne => entries > 1,
        }
    }
}

/// What happens to the init marker once the readiness handshake succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRetention {
    /// Remove the marker before the native copy so it is never mistaken for application data.
    #[default]
    RemoveOnReady,
    /// Keep the marker after a successful handshake. Combined with [`SkipThreshold::AnyEntry`]
    /// it doubles as the "already migrated" signal on the next launch.
    Retain,
}

/// Tunables of the migration protocol.
///
/// Missing fields fall back to their defaults when parsed from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct MigrationConfig {
    /// Poll ticks before the readiness handshake gives up.
    pub max_attempts: u32,
    /// Delay before the first poll tick and between ticks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Delay between a successful native copy and the final result, in milliseconds.
    pub settle_delay_ms: u64,
    /// Skip-check policy.
    pub skip_threshold: SkipThreshold,
    /// Init marker policy once storage is confirmed ready.
    pub marker_retention: MarkerRetention,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            poll_interval_ms: 1_000,
            settle_delay_ms: 1_000,
            skip_threshold: SkipThreshold::AnyEntry,
            marker_retention: MarkerRetention::RemoveOnReady,
        }
    }
}

impl MigrationConfig {
    /// Parses a JSON document into a validated config.
    ///
    /// # Errors
    /// - `ConfigError::Json` if `json` is not a valid config document
    /// - `ConfigError::Invalid` if the parsed values cannot drive a migration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values can drive a migration.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if `max_attempts` or `poll_interval_ms` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle delay as a [`Duration`].
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Errors produced while building a [`MigrationConfig`]
#[crate::migrator_error]
pub enum ConfigError {
    /// The config values cannot drive a migration
    #[error("invalid migration config: {message}")]
    Invalid {
        /// What is wrong with the config
        message: String,
    },
    /// The config document is not valid JSON for a config
    #[error("JSON error: {message}")]
    Json {
        /// The error message from `serde_json`
        message: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json {
            message: e.to_string(),
        }
    }
}

/// Initializes the global migration configuration.
///
/// Call once at application startup, before the first migration. Subsequent calls are ignored
/// with a warning.
///
/// # Examples
///
/// ## Swift
///
/// ```swift
/// var config = LocalStorageMigrator.defaultMigrationConfig()
/// config.skipThreshold = .moreThanOne
/// LocalStorageMigrator.initMigrationConfig(config: config)
/// ```
#[uniffi::export]
pub fn init_migration_config(config: MigrationConfig) {
    let summary = format!(
        "max_attempts={} poll_interval_ms={} settle_delay_ms={} skip_threshold={:?} marker_retention={:?}",
        config.max_attempts,
        config.poll_interval_ms,
        config.settle_delay_ms,
        config.skip_threshold,
        config.marker_retention
    );

    match CONFIG_INSTANCE.set(config) {
        Ok(()) => crate::info!("migration_config.initialized {}", summary),
        Err(_) => crate::warn!("migration_config.already_initialized ignoring {}", summary),
    }
}

/// Parses and validates a JSON config document, e.g. one shipped with the app bundle.
///
/// # Errors
/// See [`MigrationConfig::from_json`].
#[uniffi::export]
pub fn migration_config_from_json(json: String) -> Result<MigrationConfig, ConfigError> {
    MigrationConfig::from_json(&json)
}

/// Returns the default config, as a starting point for hosts.
#[uniffi::export]
#[must_use]
pub fn default_migration_config() -> MigrationConfig {
    MigrationConfig::default()
}

/// Gets the active config, or the defaults if [`init_migration_config`] was never called.
#[must_use]
pub fn current_config() -> MigrationConfig {
    CONFIG_INSTANCE.get().cloned().unwrap_or_else(|| {
        crate::debug!("migration_config.not_initialized using defaults");
        MigrationConfig::default()
    })
}
