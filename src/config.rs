use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::backend::models::ApiKeys;
use crate::scoring::threat::ThreatThresholds;

pub const DEFAULT_SCAN_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Central configuration loaded from environment variables.
///
/// Provider keys come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Base URL of the threat-intel scan service
    pub scan_url: String,
    /// Base URL of the recon analysis service. Empty disables analysis.
    pub analysis_url: String,
    pub db_path: String,
    /// Keys used for any provider not configured via `threatdesk keys set`
    pub env_keys: ApiKeys,
    pub thresholds: ThreatThresholds,
    /// Per-request timeout for both backends
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; malformed numbers are an error rather than
    /// a silent fallback.
    pub fn load() -> Result<Self> {
        let defaults = ThreatThresholds::default();
        let thresholds = ThreatThresholds {
            malicious_engines: env_f64("THREATDESK_MALICIOUS_MIN", defaults.malicious_engines)?,
            abuse_confidence: env_f64("THREATDESK_CONFIDENCE_MAX", defaults.abuse_confidence)?,
            otx_pulses: env_f64("THREATDESK_PULSE_MAX", defaults.otx_pulses)?,
        };

        let timeout_secs = match env::var("THREATDESK_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("THREATDESK_TIMEOUT_SECS must be whole seconds, got '{raw}'"))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            scan_url: env::var("THREATDESK_SCAN_URL")
                .unwrap_or_else(|_| DEFAULT_SCAN_URL.to_string()),
            analysis_url: env::var("THREATDESK_ANALYSIS_URL")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_URL.to_string()),
            db_path: env::var("THREATDESK_DB_PATH").unwrap_or_else(|_| default_db_path()),
            env_keys: ApiKeys {
                virustotal: env::var("VIRUSTOTAL_API_KEY").unwrap_or_default(),
                abuseipdb: env::var("ABUSEIPDB_API_KEY").unwrap_or_default(),
                alienvault: env::var("ALIENVAULT_API_KEY").unwrap_or_default(),
            },
            thresholds,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Check that the scan service URL is usable.
    /// Call this before any operation that talks to the scan backend.
    pub fn require_scan_backend(&self) -> Result<()> {
        if !self.scan_url.starts_with("http://") && !self.scan_url.starts_with("https://") {
            anyhow::bail!(
                "THREATDESK_SCAN_URL must be an http(s) URL, got '{}'.\n\
                 Fix it in your .env file.",
                self.scan_url
            );
        }
        Ok(())
    }

    /// Check that an analysis service is configured.
    /// Call this before `--analyze` or `--report`.
    /// Whether an analysis service URL is set. Blank or whitespace-only
    /// counts as unset.
    pub fn has_analysis_backend(&self) -> bool {
        !self.analysis_url.trim().is_empty()
    }

    pub fn require_analysis_backend(&self) -> Result<()> {
        if !self.has_analysis_backend() {
            anyhow::bail!(
                "THREATDESK_ANALYSIS_URL not set. AI analysis and PDF reports need the recon service.\n\
                 Add it to your .env file."
            );
        }
        Ok(())
    }
}

/// `<data dir>/threatdesk/threatdesk.db`, or `./threatdesk.db` when the
/// platform has no data directory.
fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("threatdesk").join("threatdesk.db"))
        .unwrap_or_else(|| PathBuf::from("./threatdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn env_f64(name: &str, default: f64) -> Result<f64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("{name} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_f64_default_when_unset() {
        let value = env_f64("THREATDESK_TEST_UNSET_THRESHOLD", 70.0).unwrap();
        assert_eq!(value, 70.0);
    }

    #[test]
    fn test_default_db_path_names_the_file() {
        assert!(default_db_path().ends_with("threatdesk.db"));
    }

    fn config_with_analysis_url(url: &str) -> Config {
        Config {
            scan_url: DEFAULT_SCAN_URL.to_string(),
            analysis_url: url.to_string(),
            db_path: "threatdesk.db".to_string(),
            env_keys: ApiKeys::default(),
            thresholds: ThreatThresholds::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[test]
    fn test_blank_analysis_url_is_unset() {
        assert!(!config_with_analysis_url("").has_analysis_backend());
        assert!(!config_with_analysis_url("   ").has_analysis_backend());
        assert!(config_with_analysis_url(DEFAULT_ANALYSIS_URL).has_analysis_backend());

        let err = config_with_analysis_url("  ").require_analysis_backend().unwrap_err();
        assert!(err.to_string().contains("THREATDESK_ANALYSIS_URL"));
    }
}
