//! Configuration
//!
//! Settings are layered: built-in defaults, then an optional `valet.toml`
//! (or `.yaml`/`.json`) in the data directory, then `VALET__*` environment
//! variables, e.g. `VALET__VALET__ENFORCE_STATUS_ORDER=true`.

use crate::core::PriceTable;
use crate::error::Result;
use crate::notifications::NotificationOptions;
use crate::state::CoreOptions;
use crate::storage::DEFAULT_COMPANY_NAME;
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = ".valet";

/// File stem of the configuration file inside the data directory
pub const CONFIG_FILE_STEM: &str = "valet";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "VALET";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Printed on every ticket
    pub company_name: String,
    /// Price overrides per ticket type, on top of the built-in table
    pub prices: HashMap<String, Decimal>,
    pub notifications: NotificationConfig,
    pub valet: ValetConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            prices: HashMap::new(),
            notifications: NotificationConfig::default(),
            valet: ValetConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Alerts for valets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub play_sound: bool,
    pub show_toast: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            play_sound: true,
            show_toast: true,
        }
    }
}

/// Request lifecycle rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValetConfig {
    /// Reject status changes that skip or reverse pending -> accepted -> completed
    pub enforce_status_order: bool,
}

/// Where the local store lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

/// Per-user data directory, for running outside a site directory
#[must_use]
pub fn user_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "valet-ticket", "valet-ticket").map(|dirs| dirs.data_dir().to_path_buf())
}

/// `.valet` in the working directory if present, else the per-user directory
#[must_use]
pub fn default_data_dir() -> PathBuf {
    let local = PathBuf::from(DEFAULT_DATA_DIR);
    if local.is_dir() {
        return local;
    }
    user_data_dir().unwrap_or(local)
}

impl Config {
    /// Load configuration for a data directory
    pub fn load(data_dir: Option<&Path>) -> Result<Self> {
        let dir = data_dir.map_or_else(default_data_dir, Path::to_path_buf);
        let file = dir.join(CONFIG_FILE_STEM);

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Data directory: explicit argument, then configuration, then the default
    #[must_use]
    pub fn data_dir(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.storage.data_dir.clone())
            .unwrap_or_else(default_data_dir)
    }

    /// Price table with configured overrides applied
    #[must_use]
    pub fn price_table(&self) -> PriceTable {
        PriceTable::with_overrides(&self.prices)
    }

    #[must_use]
    pub const fn notification_options(&self) -> NotificationOptions {
        NotificationOptions {
            play_sound: self.notifications.play_sound,
            show_toast: self.notifications.show_toast,
        }
    }

    /// Options for a [`crate::state::ValetCore`] built from this configuration
    #[must_use]
    pub fn core_options(&self) -> CoreOptions {
        CoreOptions {
            company_name: self.company_name.clone(),
            prices: self.price_table(),
            enforce_status_order: self.valet.enforce_status_order,
            notifications: self.notification_options(),
        }
    }
}
