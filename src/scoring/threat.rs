// Threat classification over provider payloads.
//
// A result is a threat when any provider trips its threshold: VirusTotal
// engines flagging it as malicious, an AbuseIPDB confidence score above the
// cutoff, or more AlienVault OTX pulses than the cutoff. Providers that are
// absent or returned an error are skipped, never counted as clean evidence.

use serde_json::Value;

use crate::backend::models::ScanResult;

pub const VIRUSTOTAL: &str = "virustotal";
pub const ABUSEIPDB: &str = "abuseipdb";
pub const ALIENVAULT: &str = "alienvault";

/// Configurable cutoffs for the threat rule. Each is exclusive: the value
/// must be strictly greater than the cutoff to trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatThresholds {
    /// Malicious engine count above which VirusTotal trips (default 0)
    pub malicious_engines: f64,
    /// AbuseIPDB confidence above which it trips (default 70)
    pub abuse_confidence: f64,
    /// OTX pulse count above which it trips (default 5)
    pub otx_pulses: f64,
}

impl Default for ThreatThresholds {
    fn default() -> Self {
        Self {
            malicious_engines: 0.0,
            abuse_confidence: 70.0,
            otx_pulses: 5.0,
        }
    }
}

/// Read a numeric field from a payload. Numbers sent as strings are
/// accepted; anything else counts as absent.
pub fn numeric_field(payload: &Value, field: &str) -> Option<f64> {
    match payload.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Providers whose payload trips a threshold, in rule order.
pub fn tripped_providers(result: &ScanResult, thresholds: &ThreatThresholds) -> Vec<&'static str> {
    let checks: [(&'static str, &str, f64); 3] = [
        (VIRUSTOTAL, "malicious", thresholds.malicious_engines),
        (ABUSEIPDB, "abuseConfidenceScore", thresholds.abuse_confidence),
        (ALIENVAULT, "pulse_count", thresholds.otx_pulses),
    ];

    checks
        .into_iter()
        .filter(|(provider, field, cutoff)| {
            result
                .provider(provider)
                .and_then(|payload| numeric_field(payload, field))
                .is_some_and(|value| value > *cutoff)
        })
        .map(|(provider, _, _)| provider)
        .collect()
}

/// Whether any provider marks the result as a threat.
pub fn is_threat(result: &ScanResult, thresholds: &ThreatThresholds) -> bool {
    !tripped_providers(result, thresholds).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_field_accepts_strings() {
        let payload = json!({"malicious": "3", "total": 70});
        assert_eq!(numeric_field(&payload, "malicious"), Some(3.0));
        assert_eq!(numeric_field(&payload, "total"), Some(70.0));
        assert_eq!(numeric_field(&payload, "harmless"), None);
    }

    #[test]
    fn test_numeric_field_rejects_non_numbers() {
        let payload = json!({"malicious": null, "pulse_count": [1, 2]});
        assert_eq!(numeric_field(&payload, "malicious"), None);
        assert_eq!(numeric_field(&payload, "pulse_count"), None);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let t = ThreatThresholds::default();
        let at_cutoff = ScanResult::default()
            .with_provider(ABUSEIPDB, json!({"abuseConfidenceScore": 70}))
            .with_provider(ALIENVAULT, json!({"pulse_count": 5}))
            .with_provider(VIRUSTOTAL, json!({"malicious": 0}));
        assert!(!is_threat(&at_cutoff, &t));
    }

    #[test]
    fn test_tripped_providers_lists_every_trip() {
        let t = ThreatThresholds::default();
        let result = ScanResult::default()
            .with_provider(VIRUSTOTAL, json!({"malicious": 2}))
            .with_provider(ALIENVAULT, json!({"pulse_count": 12}));
        assert_eq!(tripped_providers(&result, &t), vec![VIRUSTOTAL, ALIENVAULT]);
    }

    #[test]
    fn test_error_payload_is_skipped() {
        let t = ThreatThresholds::default();
        let result = ScanResult::default()
            .with_provider(VIRUSTOTAL, json!({"error": "API error: 401", "malicious": 9}));
        assert!(!is_threat(&result, &t));
    }
}
