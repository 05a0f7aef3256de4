// Unit tests for backend wire types.
//
// The scan service answers in one of three shapes (recon envelope, bare
// provider map, error object); these tests pin down how each is read.

use serde_json::json;

use threatdesk::backend::http::error_message;
use threatdesk::backend::models::{AnalysisResponse, ScanResponse};
use threatdesk::backend::{ApiKeys, FeedItem, HealthStatus, ScanRequest};
use threatdesk::target::TargetKind;

// ============================================================
// ScanResponse
// ============================================================

#[test]
fn envelope_success_keeps_backend_scan_id() {
    let body = json!({
        "success": true,
        "message": "Scan completed successfully",
        "scan_id": "3f2a9c",
        "data": {"metadata": {"target": "example.com", "type": "domain"}, "dns": {"A": ["93.184.216.34"]}}
    });
    let parsed: ScanResponse = serde_json::from_value(body).unwrap();
    let outcome = parsed.into_outcome().unwrap();
    assert_eq!(outcome.scan_id.as_str(), "3f2a9c");
    assert!(outcome.result.providers.contains_key("dns"));
    assert_eq!(
        outcome.result.metadata.unwrap().target.as_deref(),
        Some("example.com")
    );
}

#[test]
fn envelope_failure_carries_message() {
    let body = json!({"success": false, "message": "Scan failed: timeout", "scan_id": null, "data": null});
    let parsed: ScanResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.into_outcome().unwrap_err(), "Scan failed: timeout");
}

#[test]
fn bare_provider_map_gets_minted_id() {
    let body = json!({
        "virustotal": {"malicious": 0, "total": 70},
        "abuseipdb": {"abuseConfidenceScore": 10},
        "metadata": {"country": "US", "city": "Ashburn"}
    });
    let parsed: ScanResponse = serde_json::from_value(body).unwrap();
    let outcome = parsed.into_outcome().unwrap();
    assert!(outcome.scan_id.as_str().starts_with("local-"));
    assert_eq!(outcome.result.provider_names().count(), 2);
    assert_eq!(
        outcome.result.metadata.unwrap().geolocation().as_deref(),
        Some("US (Ashburn)")
    );
}

#[test]
fn unknown_metadata_fields_survive_a_round_trip() {
    let body = json!({
        "virustotal": {"malicious": 0},
        "metadata": {
            "target": "8.8.8.8",
            "type": "ip",
            "timestamp": "2026-05-01T09:30:00",
            "asn": 15169
        }
    });
    let parsed: ScanResponse = serde_json::from_value(body).unwrap();
    let metadata = parsed.into_outcome().unwrap().result.metadata.unwrap();
    assert_eq!(metadata.target.as_deref(), Some("8.8.8.8"));
    assert_eq!(metadata.extra["timestamp"], "2026-05-01T09:30:00");
    assert_eq!(metadata.extra["asn"], 15169);
    assert!(!metadata.extra.contains_key("target"));

    let encoded = serde_json::to_value(&metadata).unwrap();
    assert_eq!(encoded["timestamp"], "2026-05-01T09:30:00");
    assert_eq!(encoded["type"], "ip");
}

#[test]
fn minted_ids_are_unique() {
    let a: ScanResponse = serde_json::from_value(json!({"virustotal": {}})).unwrap();
    let b: ScanResponse = serde_json::from_value(json!({"virustotal": {}})).unwrap();
    assert_ne!(
        a.into_outcome().unwrap().scan_id,
        b.into_outcome().unwrap().scan_id
    );
}

#[test]
fn error_object_is_failure() {
    let parsed: ScanResponse =
        serde_json::from_value(json!({"error": "Invalid input format"})).unwrap();
    assert_eq!(parsed.into_outcome().unwrap_err(), "Invalid input format");
}

#[test]
fn provider_error_payload_is_not_data() {
    let parsed: ScanResponse = serde_json::from_value(json!({
        "virustotal": {"error": "VirusTotal API key not configured"}
    }))
    .unwrap();
    let result = parsed.into_outcome().unwrap().result;
    assert!(result.provider("virustotal").is_none());
    assert_eq!(
        result.provider_error("virustotal"),
        Some("VirusTotal API key not configured")
    );
}

// ============================================================
// Requests and other responses
// ============================================================

#[test]
fn scan_request_wire_shape() {
    let request = ScanRequest {
        target: "8.8.8.8".into(),
        kind: TargetKind::Ip,
        api_keys: ApiKeys {
            abuseipdb: "k".into(),
            ..ApiKeys::default()
        },
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        json!({
            "target": "8.8.8.8",
            "type": "ip",
            "api_keys": {"virustotal": "", "abuseipdb": "k", "alienvault": ""}
        })
    );
}

#[test]
fn analysis_response_success_and_failure() {
    let ok: AnalysisResponse = serde_json::from_value(json!({
        "success": true,
        "message": "AI analysis completed",
        "data": {
            "risk_level": "High",
            "attack_surface_summary": "Two exposed admin panels",
            "possible_vulnerabilities": ["Outdated nginx"],
            "interesting_endpoints": ["/admin"],
            "security_recommendations": ["Restrict /admin"],
            "detailed_analysis": "..."
        }
    }))
    .unwrap();
    let analysis = ok.into_result().unwrap();
    assert_eq!(analysis.risk_level, "High");
    assert_eq!(analysis.interesting_endpoints, vec!["/admin"]);

    let failed: AnalysisResponse =
        serde_json::from_value(json!({"success": false, "message": "Scan ID not found"})).unwrap();
    assert_eq!(failed.into_result().unwrap_err(), "Scan ID not found");
}

#[test]
fn feed_and_health_tolerate_missing_fields() {
    let item: FeedItem = serde_json::from_value(json!({"title": "New phishing kit"})).unwrap();
    assert_eq!(item.title, "New phishing kit");
    assert!(item.severity.is_empty());

    let health: HealthStatus =
        serde_json::from_value(json!({"status": "healthy", "service": "Recon Backend"})).unwrap();
    assert!(health.is_healthy());
}

#[test]
fn error_message_from_json_body() {
    let msg = error_message(reqwest::StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "boom"}"#);
    assert_eq!(msg, "boom");
}

#[test]
fn api_keys_fallback_fills_blanks_only() {
    let saved = ApiKeys {
        virustotal: "saved-vt".into(),
        ..ApiKeys::default()
    };
    let env = ApiKeys {
        virustotal: "env-vt".into(),
        alienvault: "env-otx".into(),
        ..ApiKeys::default()
    };
    let merged = saved.or(&env);
    assert_eq!(merged.virustotal, "saved-vt");
    assert_eq!(merged.alienvault, "env-otx");
    assert_eq!(merged.configured(), vec!["virustotal", "alienvault"]);
}
