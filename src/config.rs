//! Runtime settings
//!
//! Defaults, overridden by `SLEEPWISE_*` environment variables. The CLI applies
//! its own flags on top.

use crate::predictor::PredictorConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREDICTOR_URL: &str = "SLEEPWISE_PREDICTOR_URL";
pub const ENV_PREDICTOR_TIMEOUT_SECS: &str = "SLEEPWISE_PREDICTOR_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "SLEEPWISE_DATA_DIR";
pub const ENV_LOG: &str = "SLEEPWISE_LOG";

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// File names inside the data directory
pub const SUBMISSIONS_FILE: &str = "submissions.json";
pub const ACCOUNTS_FILE: &str = "accounts.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub predictor: PredictorConfig,
    /// Directory holding the JSON store snapshots
    pub data_dir: PathBuf,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            predictor: PredictorConfig::default(),
            data_dir: PathBuf::from(".sleepwise"),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary key lookup.
    ///
    /// Unparseable timeouts fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(url) = lookup(ENV_PREDICTOR_URL).filter(|v| !v.is_empty()) {
            settings.predictor.base_url = url;
        }

        if let Some(secs) = lookup(ENV_PREDICTOR_TIMEOUT_SECS).and_then(|v| v.parse::<u64>().ok()) {
            settings.predictor.timeout = Duration::from_secs(secs);
        }

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            settings.data_dir = PathBuf::from(dir);
        }

        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            settings.log_filter = filter;
        }

        settings
    }

    pub fn submissions_path(&self) -> PathBuf {
        self.data_dir.join(SUBMISSIONS_FILE)
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_environment() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.log_filter, "warn");
        assert_eq!(settings.predictor.timeout, Duration::from_secs(30));
        assert_eq!(settings.submissions_path(), PathBuf::from(".sleepwise/submissions.json"));
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_PREDICTOR_URL, "https://ml.example.com"),
            (ENV_PREDICTOR_TIMEOUT_SECS, "5"),
            (ENV_DATA_DIR, "/var/lib/sleepwise"),
            (ENV_LOG, "sleepwise=debug"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.predictor.base_url, "https://ml.example.com");
        assert_eq!(settings.predictor.timeout, Duration::from_secs(5));
        assert_eq!(settings.accounts_path(), PathBuf::from("/var/lib/sleepwise/accounts.json"));
        assert_eq!(settings.log_filter, "sleepwise=debug");
    }

    #[test]
    fn test_bad_timeout_keeps_default() {
        let settings = Settings::from_lookup(|k| {
            (k == ENV_PREDICTOR_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert_eq!(settings.predictor.timeout, Duration::from_secs(30));
    }
}
