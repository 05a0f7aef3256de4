// Per-provider verdicts for display and reports.

use super::threat::{numeric_field, ThreatThresholds, ABUSEIPDB, ALIENVAULT, VIRUSTOTAL};
use crate::backend::models::ScanResult;

/// AbuseIPDB confidence above which a result is shown as medium risk.
pub const MEDIUM_RISK_CONFIDENCE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Clean,
    Warning,
    Danger,
}

/// One line of the scan results panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderVerdict {
    pub label: String,
    pub value: String,
    pub badge: String,
    pub severity: Severity,
}

impl ProviderVerdict {
    fn new(label: &str, value: String, badge: &str, severity: Severity) -> Self {
        Self {
            label: label.to_string(),
            value,
            badge: badge.to_string(),
            severity,
        }
    }
}

/// Build the result lines for a scan, in the order the panel shows them.
pub fn provider_verdicts(result: &ScanResult, thresholds: &ThreatThresholds) -> Vec<ProviderVerdict> {
    let mut verdicts = Vec::new();

    for (name, label) in [
        (VIRUSTOTAL, "VirusTotal Detection"),
        (ABUSEIPDB, "AbuseIPDB Confidence"),
        (ALIENVAULT, "AlienVault OTX Pulses"),
    ] {
        if let Some(message) = result.provider_error(name) {
            verdicts.push(ProviderVerdict::new(
                label,
                message.to_string(),
                "Error",
                Severity::Warning,
            ));
            continue;
        }
        let Some(payload) = result.provider(name) else {
            continue;
        };

        let verdict = match name {
            VIRUSTOTAL => {
                let malicious = numeric_field(payload, "malicious").unwrap_or(0.0);
                let total = numeric_field(payload, "total").unwrap_or(0.0);
                let hit = malicious > thresholds.malicious_engines;
                ProviderVerdict::new(
                    label,
                    format!("{malicious}/{total} engines"),
                    if hit { "Malicious" } else { "Clean" },
                    if hit { Severity::Danger } else { Severity::Clean },
                )
            }
            ABUSEIPDB => {
                let confidence = numeric_field(payload, "abuseConfidenceScore").unwrap_or(0.0);
                let (badge, severity) = if confidence > thresholds.abuse_confidence {
                    ("High Risk", Severity::Danger)
                } else if confidence > MEDIUM_RISK_CONFIDENCE {
                    ("Medium Risk", Severity::Warning)
                } else {
                    ("Low Risk", Severity::Clean)
                };
                ProviderVerdict::new(label, format!("{confidence}%"), badge, severity)
            }
            _ => {
                let pulses = numeric_field(payload, "pulse_count").unwrap_or(0.0);
                let hit = pulses > thresholds.otx_pulses;
                ProviderVerdict::new(
                    label,
                    format!("{pulses} pulses"),
                    if hit { "Suspicious" } else { "Normal" },
                    if hit { Severity::Danger } else { Severity::Clean },
                )
            }
        };
        verdicts.push(verdict);
    }

    if let Some(geo) = result.metadata.as_ref().and_then(|m| m.geolocation()) {
        verdicts.push(ProviderVerdict::new("Geolocation", geo, "Geo", Severity::Clean));
    }

    verdicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::ScanMetadata;
    use serde_json::json;

    #[test]
    fn test_abuse_bands() {
        let t = ThreatThresholds::default();
        for (score, badge) in [(85, "High Risk"), (55, "Medium Risk"), (10, "Low Risk")] {
            let result = ScanResult::default()
                .with_provider(ABUSEIPDB, json!({"abuseConfidenceScore": score}));
            let verdicts = provider_verdicts(&result, &t);
            assert_eq!(verdicts.len(), 1);
            assert_eq!(verdicts[0].badge, badge);
        }
    }

    #[test]
    fn test_virustotal_counts_render_as_integers() {
        let t = ThreatThresholds::default();
        let result = ScanResult::default()
            .with_provider(VIRUSTOTAL, json!({"malicious": 3, "total": 90}));
        let verdicts = provider_verdicts(&result, &t);
        assert_eq!(verdicts[0].value, "3/90 engines");
        assert_eq!(verdicts[0].severity, Severity::Danger);
    }

    #[test]
    fn test_error_and_geolocation_lines() {
        let t = ThreatThresholds::default();
        let result = ScanResult::default()
            .with_provider(ALIENVAULT, json!({"error": "API error: 403"}))
            .with_metadata(ScanMetadata {
                country: Some("US".to_string()),
                city: Some("Mountain View".to_string()),
                ..Default::default()
            });
        let verdicts = provider_verdicts(&result, &t);
        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[0].badge, "Error");
        assert_eq!(verdicts[1].value, "US (Mountain View)");
    }
}
