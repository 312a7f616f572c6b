//! ==============================================================================
//! config.rs - feed configuration loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `feed.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - PathsConfig: the spreadsheet we read and the three json files we write.
//!     - PollingConfig: how long to sleep between cycles.
//!     - HistoryConfig: how many samples the rolling window keeps.
//!     - ColumnsConfig: header names of the required spreadsheet columns.
//!     - LoggingConfig: tracing filter and per-sample logging toggle.
//!
//! every section is optional; missing sections take the defaults below.
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FeedConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub source: PathBuf,
    pub current: PathBuf,
    pub history: PathBuf,
    pub state: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_len: usize,
}

/// Spreadsheet header for each sample field
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnsConfig {
    pub timestamp: String,
    pub ph: String,
    pub turbidity: String,
    pub temperature: String,
    pub tds: String,
    pub conductivity: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_samples: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data = PathBuf::from("data");
        Self {
            source: data.join("water_data.xlsx"),
            current: data.join("data.json"),
            history: data.join("history.json"),
            state: data.join("state.json"),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        // matches the dashboard's fetch interval
        Self { interval_seconds: 4 }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_len: 120 }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            timestamp: "Timestamp".to_string(),
            ph: "pH".to_string(),
            turbidity: "Turbidity_NTU".to_string(),
            temperature: "Temperature_C".to_string(),
            tds: "TDS_ppm".to_string(),
            conductivity: "Conductivity_uS".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_samples: false }
    }
}

impl ColumnsConfig {
    /// All required headers, timestamp first
    pub fn required(&self) -> [&str; 6] {
        [
            self.timestamp.as_str(),
            self.ph.as_str(),
            self.turbidity.as_str(),
            self.temperature.as_str(),
            self.tds.as_str(),
            self.conductivity.as_str(),
        ]
    }
}

impl FeedConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        let config: FeedConfig = toml::from_str(&content)
            .context("Failed to parse config")?;

        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        let paths = [
            PathBuf::from("config").join("feed.toml"),
            PathBuf::from("..").join("config").join("feed.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.polling.interval_seconds == 0 {
            bail!("polling.interval_seconds must be at least 1");
        }
        if self.history.max_len == 0 {
            bail!("history.max_len must be at least 1");
        }
        if let Some(empty) = self.columns.required().iter().position(|c| c.trim().is_empty()) {
            bail!("columns: header #{} is empty", empty + 1);
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│           FEED CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Source: {}", self.paths.source.display());
        println!("│ Current: {}", self.paths.current.display());
        println!("│ History: {} (last {})", self.paths.history.display(), self.history.max_len);
        println!("│ State: {}", self.paths.state.display());
        println!("│ Poll Interval: {}s", self.polling.interval_seconds);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("feed.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn empty_file_takes_defaults() {
        let dir = TempDir::new().unwrap();
        let config = FeedConfig::load(write(&dir, "")).unwrap();

        assert_eq!(config.polling.interval_seconds, 4);
        assert_eq!(config.history.max_len, 120);
        assert_eq!(config.paths.current, PathBuf::from("data").join("data.json"));
        assert_eq!(config.columns, ColumnsConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_override_only_named_keys() {
        let dir = TempDir::new().unwrap();
        let body = r#"
[paths]
source = "in/readings.csv"

[history]
max_len = 30

[columns]
ph = "PH"
"#;
        let config = FeedConfig::load(write(&dir, body)).unwrap();

        assert_eq!(config.paths.source, PathBuf::from("in/readings.csv"));
        assert_eq!(config.paths.state, PathBuf::from("data").join("state.json"));
        assert_eq!(config.history.max_len, 30);
        assert_eq!(config.columns.ph, "PH");
        assert_eq!(config.columns.tds, "TDS_ppm");
    }

    #[test]
    fn rejects_zero_cap_and_interval() {
        let dir = TempDir::new().unwrap();
        assert!(FeedConfig::load(write(&dir, "[history]\nmax_len = 0\n")).is_err());
        assert!(FeedConfig::load(write(&dir, "[polling]\ninterval_seconds = 0\n")).is_err());
    }

    #[test]
    fn rejects_blank_column_name() {
        let dir = TempDir::new().unwrap();
        let err = FeedConfig::load(write(&dir, "[columns]\ntds = \"  \"\n")).unwrap_err();
        assert!(err.to_string().contains("#5"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(FeedConfig::load(write(&dir, "[polling\n")).is_err());
    }
}
