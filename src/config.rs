use crate::error::{Result, ScraperError};
use chrono::{Duration as ChronoDuration, FixedOffset, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration, loaded from `config.toml` when present. Every
/// field has a default matching the reference deployment, so the scraper
/// runs with no config file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shard number; selects `venues{shard}.json` and suffixes the output
    /// artifact names.
    pub shard: u32,
    /// Per-request client timeout, seconds. Must sit inside the hard
    /// deadline or the deadline never fires first.
    pub api_timeout_secs: u64,
    /// Hard wall-clock deadline for one fetch, seconds.
    pub hard_timeout_secs: u64,
    /// Inter-venue delay bounds, milliseconds.
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    /// Root directory for output artifacts; the date code is appended.
    pub data_dir: String,
    /// Venue roster file; defaults to `venues{shard}.json`.
    pub venues_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard: 4,
            api_timeout_secs: 12,
            hard_timeout_secs: 15,
            delay_min_ms: 350,
            delay_max_ms: 700,
            data_dir: "advance/data".to_string(),
            venues_file: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{path}': {e}"))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        if config.hard_timeout_secs <= config.api_timeout_secs {
            return Err(ScraperError::Config(
                "hard_timeout_secs must exceed api_timeout_secs".to_string(),
            ));
        }
        if config.delay_min_ms > config.delay_max_ms {
            return Err(ScraperError::Config(
                "delay_min_ms must not exceed delay_max_ms".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn hard_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }

    pub fn venues_path(&self) -> PathBuf {
        match &self.venues_file {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(format!("venues{}.json", self.shard)),
        }
    }

    /// Output directory for one run: `{data_dir}/{date_code}`.
    pub fn run_dir(&self, date_code: &str) -> PathBuf {
        Path::new(&self.data_dir).join(date_code)
    }
}

/// Showtime availability is published per calendar day in Indian Standard
/// Time; the advance-booking snapshot always targets tomorrow's date.
pub fn default_date_code() -> String {
    let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
    let tomorrow = Utc::now().with_timezone(&ist) + ChronoDuration::days(1);
    tomorrow.format("%Y%m%d").to_string()
}
