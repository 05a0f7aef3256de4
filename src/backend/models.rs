// Wire and domain types shared by the scan and analysis backends.
//
// The backends own their exact response shapes. The types here accept the
// two outcome shapes the dashboard relies on (success with a result, or a
// failure with a message) and leave provider payloads as raw JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::target::TargetKind;

/// Provider API keys forwarded to the scan backend untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub virustotal: String,
    pub abuseipdb: String,
    pub alienvault: String,
}

impl ApiKeys {
    /// Names of the providers that have a key set.
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if !self.virustotal.is_empty() {
            names.push("virustotal");
        }
        if !self.abuseipdb.is_empty() {
            names.push("abuseipdb");
        }
        if !self.alienvault.is_empty() {
            names.push("alienvault");
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.configured().is_empty()
    }

    /// Fill any blank key from `fallback`.
    pub fn or(self, fallback: &ApiKeys) -> ApiKeys {
        let pick = |own: String, other: &str| {
            if own.is_empty() {
                other.to_string()
            } else {
                own
            }
        };
        ApiKeys {
            virustotal: pick(self.virustotal, &fallback.virustotal),
            abuseipdb: pick(self.abuseipdb, &fallback.abuseipdb),
            alienvault: pick(self.alienvault, &fallback.alienvault),
        }
    }
}

static MINTED: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier of a completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for backends that answer without one.
    pub fn mint() -> Self {
        let seq = MINTED.fetch_add(1, Ordering::Relaxed);
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%6f");
        Self(format!("local-{stamp}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub api_keys: ApiKeys,
}

/// Optional context the backend attaches to a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Anything else the backend sent, e.g. the scan `timestamp`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ScanMetadata {
    /// "Country (City)" when a country is known.
    pub fn geolocation(&self) -> Option<String> {
        let country = self.country.as_deref().filter(|c| !c.is_empty())?;
        Some(match self.city.as_deref().filter(|c| !c.is_empty()) {
            Some(city) => format!("{country} ({city})"),
            None => country.to_string(),
        })
    }
}

/// Provider name (or recon section) to its raw payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ScanMetadata>,
    #[serde(flatten)]
    pub providers: BTreeMap<String, Value>,
}

impl ScanResult {
    pub fn with_provider(mut self, name: &str, payload: Value) -> Self {
        self.providers.insert(name.to_string(), payload);
        self
    }

    pub fn with_metadata(mut self, metadata: ScanMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Payload for `name`, unless the provider reported an error instead.
    pub fn provider(&self, name: &str) -> Option<&Value> {
        self.providers
            .get(name)
            .filter(|payload| payload.get("error").is_none())
    }

    /// Error message a provider returned in place of data.
    pub fn provider_error(&self, name: &str) -> Option<&str> {
        self.providers
            .get(name)
            .and_then(|payload| payload.get("error"))
            .and_then(Value::as_str)
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.metadata.is_none()
    }
}

/// A successful scan as seen by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub scan_id: ScanId,
    pub result: ScanResult,
}

/// Response from `POST /scan`.
///
/// The recon backend wraps results in an envelope with a `scan_id`; the
/// threat-intel backend returns the provider map directly, or `{error}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScanResponse {
    Envelope {
        success: bool,
        #[serde(default)]
        message: String,
        #[serde(default)]
        scan_id: Option<String>,
        #[serde(default)]
        data: Option<ScanResult>,
    },
    Failure {
        error: String,
    },
    Bare(ScanResult),
}

impl ScanResponse {
    /// Collapse into an outcome or the backend's failure message.
    pub fn into_outcome(self) -> Result<ScanOutcome, String> {
        match self {
            ScanResponse::Envelope {
                success: true,
                scan_id,
                data,
                ..
            } => Ok(ScanOutcome {
                scan_id: scan_id.map(ScanId::new).unwrap_or_else(ScanId::mint),
                result: data.unwrap_or_default(),
            }),
            ScanResponse::Envelope { message, .. } => Err(if message.is_empty() {
                "Scan failed".to_string()
            } else {
                message
            }),
            ScanResponse::Failure { error } => Err(error),
            ScanResponse::Bare(result) => Ok(ScanOutcome {
                scan_id: ScanId::mint(),
                result,
            }),
        }
    }
}

/// Analysis of a completed scan. Displayed as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub risk_level: String,
    pub attack_surface_summary: String,
    pub possible_vulnerabilities: Vec<String>,
    pub interesting_endpoints: Vec<String>,
    pub security_recommendations: Vec<String>,
    pub detailed_analysis: String,
}

/// Response from `POST /analyze/{scan_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<AnalysisResult>,
}

impl AnalysisResponse {
    pub fn into_result(self) -> Result<AnalysisResult, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("Analysis response contained no data".to_string()),
            (false, _) if self.message.is_empty() => Err("Analysis failed".to_string()),
            (false, _) => Err(self.message),
        }
    }
}

/// One item of the live threat feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub severity: String,
    pub source: String,
    pub timestamp: String,
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
