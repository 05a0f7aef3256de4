use anyhow::Result;
use csv::Writer;

use super::ExportOptions;
use crate::scoring::threat::{numeric_field, ABUSEIPDB, ALIENVAULT, VIRUSTOTAL};
use crate::session::history::HistoryEntry;

const HEADER: [&str; 8] = [
    "Target",
    "Type",
    "Verdict",
    "Timestamp",
    "VirusTotal Malicious",
    "AbuseIPDB Confidence",
    "OTX Pulses",
    "Location",
];

pub(super) fn render(entries: &[HistoryEntry], options: &ExportOptions) -> Result<Vec<u8>> {
    let mut wtr = Writer::from_writer(vec![]);

    let mut header: Vec<&str> = HEADER.to_vec();
    if options.include_raw {
        header.push("Raw Result");
    }
    wtr.write_record(&header)?;

    for entry in entries {
        let mut record = vec![
            entry.target.clone(),
            entry.kind.to_string(),
            entry.verdict().to_string(),
            entry.timestamp.to_rfc3339(),
            provider_number(entry, VIRUSTOTAL, "malicious"),
            provider_number(entry, ABUSEIPDB, "abuseConfidenceScore"),
            provider_number(entry, ALIENVAULT, "pulse_count"),
            entry
                .result
                .metadata
                .as_ref()
                .and_then(|m| m.geolocation())
                .unwrap_or_default(),
        ];
        if options.include_raw {
            record.push(serde_json::to_string(&entry.result)?);
        }
        wtr.write_record(&record)?;
    }

    Ok(wtr.into_inner()?)
}

fn provider_number(entry: &HistoryEntry, provider: &str, field: &str) -> String {
    entry
        .result
        .provider(provider)
        .and_then(|payload| numeric_field(payload, field))
        .map(|n| n.to_string())
        .unwrap_or_default()
}
