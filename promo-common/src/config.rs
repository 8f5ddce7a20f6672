//! Configuration loading and resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `PROMO_CONFIG` environment variable
//! 3. `<user config dir>/promo/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not fatal. A missing database URL is, but only
//! when a command asks for it via [`EngineConfig::require_database_url`].

use crate::db::models::Area;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PROMO_CONFIG";

/// Upper bound on rows per batched write
pub const MAX_BATCH_SIZE: usize = 1000;

/// Sheet names read from the source workbook
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SheetNames {
    pub stores: String,
    pub promoters: String,
    pub sales: Vec<String>,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            stores: "Toko".to_string(),
            promoters: "Promotor".to_string(),
            sales: vec!["Penjualan".to_string()],
        }
    }
}

/// Evidence photo cleanup settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CleanupConfig {
    pub asset_root: Option<PathBuf>,
    pub retention_days: Option<u32>,
    /// Value expected in the `x-cleanup-secret` header. Unset disables the trigger.
    pub shared_secret: Option<String>,
}

impl CleanupConfig {
    pub const DEFAULT_RETENTION_DAYS: u32 = 90;

    pub fn retention_days(&self) -> u32 {
        self.retention_days.unwrap_or(Self::DEFAULT_RETENTION_DAYS)
    }

    pub fn require_asset_root(&self) -> Result<&Path> {
        self.asset_root
            .as_deref()
            .ok_or_else(|| Error::Config("cleanup.asset_root is not configured".to_string()))
    }
}

/// Engine configuration as read from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database_url: Option<String>,
    pub cutover_date: Option<NaiveDate>,
    pub batch_size: usize,
    pub bcrypt_cost: u32,
    pub default_pin: String,
    pub account_domain: String,
    pub sheets: SheetNames,
    /// Canonical area code -> supervisor-group account key
    pub supervisors: BTreeMap<String, String>,
    pub cleanup: CleanupConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let supervisors = Area::ALL
            .into_iter()
            .map(|area| {
                (
                    area.code().to_string(),
                    format!("spv.{}@promo.local", area.code().to_ascii_lowercase()),
                )
            })
            .collect();

        Self {
            database_url: None,
            cutover_date: None,
            batch_size: 500,
            bcrypt_cost: 10,
            default_pin: "1234".to_string(),
            account_domain: "promo.local".to_string(),
            sheets: SheetNames::default(),
            supervisors,
            cleanup: CleanupConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration following the resolution priority.
    ///
    /// `database_url` (from CLI or env) overrides the file value.
    pub fn load(cli_path: Option<&Path>, database_url: Option<String>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => Self::from_file(&path)?,
            None => {
                warn!("No config file found, using compiled defaults");
                Self::default()
            }
        };

        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            config.database_url = Some(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Reject values that would misbehave later in a run
    pub fn validate(&mut self) -> Result<()> {
        if self.batch_size == 0 {
            warn!("batch_size 0 is invalid, using 1");
        }
        self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);

        if !is_pin(&self.default_pin) {
            return Err(Error::Config(
                "default_pin must be exactly four digits".to_string(),
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(Error::Config(format!(
                "bcrypt_cost {} outside 4..=31",
                self.bcrypt_cost
            )));
        }

        for (code, key) in self.supervisors.iter_mut() {
            code.parse::<Area>()
                .map_err(|_| Error::Config(format!("Unknown area in [supervisors]: {}", code)))?;
            // Account emails are stored lowercased
            *key = key.trim().to_lowercase();
        }

        if self.sheets.sales.is_empty() {
            return Err(Error::Config("sheets.sales must name at least one sheet".to_string()));
        }

        Ok(())
    }

    /// Database URL, or a fatal configuration error
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "database_url is not set (use --database-url, PROMO_DATABASE_URL or the config file)"
                        .to_string(),
                )
            })
    }

    pub fn require_cutover(&self) -> Result<NaiveDate> {
        self.cutover_date
            .ok_or_else(|| Error::Config("cutover_date is not set".to_string()))
    }

    /// Supervisor account key for `area`
    pub fn supervisor_key(&self, area: Area) -> Option<&str> {
        self.supervisors
            .iter()
            .find(|(code, _)| code.parse::<Area>().ok() == Some(area))
            .map(|(_, key)| key.as_str())
    }
}

/// Exactly four ASCII digits
pub fn is_pin(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    dirs::config_dir()
        .map(|d| d.join("promo").join("config.toml"))
        .filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.supervisor_key(Area::Sumba), Some("spv.sumba@promo.local"));
    }

    #[test]
    fn test_missing_database_url_is_config_error() {
        let config = EngineConfig::default();
        let err = config.require_database_url().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_toml() {
        let mut config = EngineConfig::from_toml_str(
            r#"
            database_url = "sqlite:///tmp/promo.db?mode=rwc"
            cutover_date = "2025-09-01"
            batch_size = 5000
            [sheets]
            sales = ["Agustus", "September"]
            [supervisors]
            KUPANG = "sator.kota@example.test"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.batch_size, MAX_BATCH_SIZE);
        assert_eq!(config.sheets.stores, "Toko");
        assert_eq!(config.sheets.sales.len(), 2);
        assert_eq!(config.supervisor_key(Area::Kupang), Some("sator.kota@example.test"));
        // Explicit table replaces the default map
        assert_eq!(config.supervisor_key(Area::Sumba), None);
        assert_eq!(
            config.require_cutover().unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_bad_pin_rejected() {
        let mut config = EngineConfig {
            default_pin: "12a4".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_supervisor_keys_lowercased() {
        let mut config = EngineConfig::from_toml_str(
            r#"
            [supervisors]
            KUPANG = " SPV.Kupang@Promo.Local "
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.supervisor_key(Area::Kupang), Some("spv.kupang@promo.local"));
    }

    #[test]
    fn test_unknown_supervisor_area_rejected() {
        let mut config = EngineConfig::default();
        config.supervisors.insert("FLORES".to_string(), "x@y".to_string());
        assert!(config.validate().is_err());
    }
}
