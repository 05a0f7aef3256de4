// Report exporter: renders scan history into a downloadable file.
//
// Exporting is pure: it reads the entries it is given and never touches the
// history, the counters or the scan session.

mod csv;
mod json;
mod markdown;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::backend::models::AnalysisResult;
use crate::error::DeskError;
use crate::scoring::threat::ThreatThresholds;
use crate::session::history::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Human-readable Markdown report.
    Document,
    /// One CSV row per scan.
    Spreadsheet,
    /// Pretty-printed JSON with every field of every entry.
    StructuredData,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Document => "md",
            ExportFormat::Spreadsheet => "csv",
            ExportFormat::StructuredData => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" | "document" => Ok(ExportFormat::Document),
            "csv" | "spreadsheet" => Ok(ExportFormat::Spreadsheet),
            "json" | "structured" => Ok(ExportFormat::StructuredData),
            other => Err(format!(
                "unknown export format '{other}' (expected md, csv or json)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    /// Include the raw provider payloads (CSV column, Markdown code blocks).
    pub include_raw: bool,
    /// Analysis of the current scan, appended to the document format.
    pub analysis: Option<AnalysisResult>,
    pub thresholds: ThreatThresholds,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Threat Intelligence Report".to_string(),
            generated_at: Utc::now(),
            include_raw: true,
            analysis: None,
            thresholds: ThreatThresholds::default(),
        }
    }
}

/// Render `entries` in `format`. Fails with `EmptyInput` when there is
/// nothing to render.
pub fn export(
    entries: &[HistoryEntry],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<Vec<u8>, DeskError> {
    if entries.is_empty() {
        return Err(DeskError::EmptyInput);
    }

    let bytes = match format {
        ExportFormat::Document => markdown::render(entries, options).into_bytes(),
        ExportFormat::Spreadsheet => self::csv::render(entries, options)
            .map_err(|e| DeskError::Export(format!("{e:#}")))?,
        ExportFormat::StructuredData => json::render(entries, options)
            .map_err(|e| DeskError::Export(format!("{e:#}")))?,
    };

    debug!(format = %format, entries = entries.len(), bytes = bytes.len(), "Export rendered");
    Ok(bytes)
}

/// Suggested file name, e.g. `threatdesk-report-20260101-120000.csv`.
pub fn file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "threatdesk-report-{}.{}",
        at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_formats() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Spreadsheet);
        assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Document);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::StructuredData);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            file_name(ExportFormat::Spreadsheet, at),
            "threatdesk-report-20260304-050607.csv"
        );
    }

    #[test]
    fn test_empty_input_rejected_for_every_format() {
        for format in [
            ExportFormat::Document,
            ExportFormat::Spreadsheet,
            ExportFormat::StructuredData,
        ] {
            let err = export(&[], format, &ExportOptions::default()).unwrap_err();
            assert!(matches!(err, DeskError::EmptyInput));
        }
    }
}
