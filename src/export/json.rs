use anyhow::Result;
use serde::Serialize;

use super::ExportOptions;
use crate::backend::models::AnalysisResult;
use crate::session::history::{AggregateStats, HistoryEntry};

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    generated_at: String,
    stats: AggregateStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a AnalysisResult>,
    entries: &'a [HistoryEntry],
}

pub(super) fn render(entries: &[HistoryEntry], options: &ExportOptions) -> Result<Vec<u8>> {
    let report = JsonReport {
        title: &options.title,
        generated_at: options.generated_at.to_rfc3339(),
        stats: AggregateStats::from_entries(entries),
        analysis: options.analysis.as_ref(),
        entries,
    };
    Ok(serde_json::to_vec_pretty(&report)?)
}
