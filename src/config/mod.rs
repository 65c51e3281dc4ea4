use crate::core::stats::StatsPolicy;
use crate::errors::{AppError, AppResult};
use crate::utils::time::parse_time;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    /// User id used when a command does not pass `--user`.
    #[serde(default = "default_user")]
    pub default_user: String,
    /// Check-ins after this time count as late (HH:MM).
    #[serde(default = "default_late_after")]
    pub late_after: String,
    /// Check-outs before this time count as early (HH:MM).
    #[serde(default = "default_early_before")]
    pub early_before: String,
    /// Pending records at or below this accuracy (meters) are auto-approved.
    #[serde(default)]
    pub auto_approve_max_accuracy: Option<f64>,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_user() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string())
}
fn default_late_after() -> String {
    "09:00".to_string()
}
fn default_early_before() -> String {
    "17:00".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            default_user: default_user(),
            late_after: default_late_after(),
            early_before: default_early_before(),
            auto_approve_max_accuracy: None,
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rgeoattend")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rgeoattend")
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rgeoattend.conf")
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rgeoattend.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.stats_policy()?;
        Ok(cfg)
    }

    /// Create the config directory, the config file (unless `is_test`) and an
    /// empty database file. Returns the configuration that was written.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();

        let db_path = match custom_db {
            Some(name) => {
                let p = crate::utils::path::expand_tilde(&name);
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Self::default()
        };

        if !is_test {
            fs::create_dir_all(&dir)?;
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }

    /// Late/early thresholds for the stats rollup.
    pub fn stats_policy(&self) -> AppResult<StatsPolicy> {
        let late_after = parse_time(&self.late_after).ok_or_else(|| {
            AppError::Config(format!("late_after: invalid time '{}'", self.late_after))
        })?;
        let early_before = parse_time(&self.early_before).ok_or_else(|| {
            AppError::Config(format!("early_before: invalid time '{}'", self.early_before))
        })?;
        Ok(StatsPolicy {
            late_after,
            early_before,
        })
    }
}
