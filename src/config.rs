use anyhow::bail;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DstError, Result};
use crate::oracle::TIMEZONEDB_API_URL;
use crate::reconcile::{ReconcileSettings, DEFAULT_TOLERANCE_SECS};
use crate::store::{default_backup_path, RecordStore};

/// Key-value file read alongside the environment
pub const DEFAULT_CONFIG_FILE: &str = "DSTTransitionChecker.config";
pub const DEFAULT_STORE_FILE: &str = "sampleTimezone.json";
pub const DEFAULT_PACING_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct Config {
    // Handler executable run for imminent transitions
    pub transition_batch: PathBuf,

    // TimeZoneDB access
    pub timezonedb_api_key: String,
    pub timezonedb_url: String,

    // Record store; backup defaults to "<store>.backup"
    pub store_path: PathBuf,
    pub backup_path: Option<PathBuf>,

    // Classification window and inter-record pacing
    pub tolerance_secs: i64,
    pub pacing_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env if present, ignore if missing

        let config_file = env::var("DSTCHECK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let file_values = read_config_file(Path::new(&config_file))?;

        Self::from_getter(|key| env::var(key).ok().or_else(|| file_values.get(key).cloned()))
    }

    /// Parse config from a custom getter function (for testing)
    pub fn from_getter<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            transition_batch: non_empty("TRANSITION_BATCH")
                .or_else(|| non_empty("transitionBatch"))
                .map(|v| PathBuf::from(v.trim()))
                .ok_or(DstError::ConfigMissing("TRANSITION_BATCH"))?,

            timezonedb_api_key: non_empty("TIMEZONEDB_API_KEY")
                .map(|v| v.trim().to_string())
                .ok_or(DstError::ConfigMissing("TIMEZONEDB_API_KEY"))?,
            timezonedb_url: non_empty("TIMEZONEDB_URL")
                .unwrap_or_else(|| TIMEZONEDB_API_URL.to_string()),

            store_path: non_empty("DSTCHECK_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
            backup_path: non_empty("DSTCHECK_BACKUP").map(PathBuf::from),

            tolerance_secs: parse_or(&get, "TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS)?,
            pacing_delay_ms: parse_or(&get, "PACING_DELAY_MS", DEFAULT_PACING_DELAY_MS)?,
        })
    }

    /// Create config from a HashMap (convenience for testing)
    #[cfg(test)]
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_getter(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Point the run at a different store. An explicit backup path is kept.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn backup_path(&self) -> PathBuf {
        self.backup_path
            .clone()
            .unwrap_or_else(|| default_backup_path(&self.store_path))
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(self.store_path.clone(), self.backup_path())
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            tolerance_secs: self.tolerance_secs,
            pacing_delay: Duration::from_millis(self.pacing_delay_ms),
        }
    }

    /// Validate configuration values at startup.
    /// Returns Ok(()) if all validations pass, or Err with details of what failed.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if !self.transition_batch.exists() {
            errors.push(format!(
                "Transition handler not found at '{}'.",
                self.transition_batch.display()
            ));
        }

        if !self.store_path.exists() {
            errors.push(format!(
                "Record store not found at '{}'.",
                self.store_path.display()
            ));
        }

        if !self.timezonedb_url.starts_with("http://") && !self.timezonedb_url.starts_with("https://") {
            errors.push(format!(
                "TIMEZONEDB_URL '{}' must be an http(s) URL.",
                self.timezonedb_url
            ));
        }

        if self.tolerance_secs <= 0 {
            errors.push(format!(
                "TOLERANCE_SECS={} must be greater than 0.",
                self.tolerance_secs
            ));
        }

        if self.pacing_delay_ms > 60_000 {
            errors.push(format!(
                "PACING_DELAY_MS={} seems too long (max recommended: 60000).",
                self.pacing_delay_ms
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }
}

fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| DstError::ConfigInvalid { key, value }),
    }
}

/// Read `key=value` lines from the config file. A missing file is empty;
/// a file that exists but cannot be parsed is fatal.
///
/// Values are taken as written: no quoting rules and no escapes, so Windows
/// paths such as `C:\scripts\transition.bat` survive intact.
pub fn read_config_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let invalid = |reason: String| DstError::ConfigInvalid {
        key: "DSTCHECK_CONFIG",
        value: format!("{}: {}", path.display(), reason),
    };

    let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    parse_config_lines(&text).map_err(invalid)
}

fn parse_config_lines(text: &str) -> std::result::Result<HashMap<String, String>, String> {
    let mut values = HashMap::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("line {}: expected key=value, got '{}'", index + 1, line))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {}: empty key", index + 1));
        }
        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    Ok(values)
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
