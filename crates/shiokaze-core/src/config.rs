use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume used when the preference store has nothing saved.
    #[serde(default = "default_volume")]
    pub default_volume: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Optional `[[station]]` TOML file replacing the built-in catalog.
    #[serde(default = "default_stations_file")]
    pub stations_file: PathBuf,
    /// Persisted volume / last station.
    #[serde(default = "default_prefs_file")]
    pub prefs_file: PathBuf,
    /// Log file written by the headless binary.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            stations_file: default_stations_file(),
            prefs_file: default_prefs_file(),
            log_file: default_log_file(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiokaze")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiokaze")
}

fn default_volume() -> f32 {
    0.5
}

fn default_stations_file() -> PathBuf {
    config_dir().join("stations.toml")
}

fn default_prefs_file() -> PathBuf {
    data_dir().join("prefs.json")
}

fn default_log_file() -> PathBuf {
    data_dir().join("shiokaze.log")
}

impl Config {
    /// Loads the config file, writing a default one on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &PathBuf) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}
