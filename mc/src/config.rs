//! Configuration for mapcompiler

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::rules::Rules;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root folder for generated configuration
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Data areas file holding audit columns (default: `<output-dir>/mint/mint_data_areas.json`)
    #[serde(rename = "data-areas-file")]
    pub data_areas_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Landing-zone source database access
    pub source: SourceConfig,

    /// Values passed through into generated artifacts
    pub output: OutputConfig,

    /// Type dictionary, data area chain and required columns
    pub rules: Rules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("config"),
            data_areas_file: None,
            log_level: None,
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            rules: Rules::default(),
        }
    }
}

/// Where the landing-zone connection string is kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Vault holding the source database connection string
    #[serde(rename = "key-vault")]
    pub key_vault: Option<String>,

    /// Name of the connection string secret
    #[serde(rename = "secret-name")]
    pub secret_name: Option<String>,
}

/// Deployment values copied into generated artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Table path used for both ends of every pipeline linkage
    #[serde(rename = "table-path")]
    pub table_path: String,

    /// Storage account holding the generated configuration
    #[serde(rename = "config-storage-account")]
    pub config_storage_account: Option<String>,

    /// Key vault the pipeline reads its secrets from
    #[serde(rename = "key-vault-name")]
    pub key_vault_name: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_path: "cura".to_string(),
            config_storage_account: None,
            key_vault_name: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read only the log level, before logging is set up
    ///
    /// Any problem with the file yields `None`; [`Config::load`] reports it later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        #[derive(Deserialize)]
        struct LogLevelOnly {
            #[serde(rename = "log-level")]
            log_level: Option<String>,
        }

        let path = config_path.cloned().or_else(Self::find_config_file)?;
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<LogLevelOnly>(&content).ok()?.log_level
    }

    /// First existing file of: ./mapcompiler.yml, ~/.config/mapcompiler/mapcompiler.yml
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from("mapcompiler.yml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("mapcompiler").join("mapcompiler.yml"))
            .filter(|path| path.exists())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Path of the data areas file
    pub fn data_areas_path(&self) -> PathBuf {
        self.data_areas_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join("mint").join("mint_data_areas.json"))
    }
}
