use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::rates::{DEFAULT_FALLBACK_RATES, RateTable, SUPPORTED_CURRENCIES};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CnbProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub cnb: Option<CnbProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            cnb: Some(CnbProviderConfig {
                base_url: "https://api.cnb.cz".to_string(),
                timeout_secs: default_timeout_secs(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Base currency every table is quoted against.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Allow-list of convertible currency codes.
    #[serde(default = "default_supported")]
    pub supported_currencies: Vec<String>,
    /// Overrides for the static fallback table, per currency code.
    #[serde(default)]
    pub fallback_rates: BTreeMap<String, f64>,
}

fn default_currency() -> String {
    "CZK".to_string()
}

fn default_supported() -> Vec<String> {
    SUPPORTED_CURRENCIES.iter().map(|c| c.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            providers: ProvidersConfig::default(),
            supported_currencies: default_supported(),
            fallback_rates: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not
    /// exist yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file found, using defaults");
            return Ok(AppConfig::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "finlytics", "finlytics")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// The static fallback table: built-in constants overlaid with any
    /// configured overrides, base always at 1.
    pub fn fallback_table(&self) -> RateTable {
        let mut table = RateTable::new(&self.currency);
        for (code, rate) in &self.fallback_rates {
            table.insert(code, *rate);
        }
        table.backfill_from(&DEFAULT_FALLBACK_RATES);
        table
    }
}
