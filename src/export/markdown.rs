use super::ExportOptions;
use crate::backend::models::AnalysisResult;
use crate::scoring::verdict::provider_verdicts;
use crate::session::history::{AggregateStats, HistoryEntry};

pub(super) fn render(entries: &[HistoryEntry], options: &ExportOptions) -> String {
    let mut md = String::new();
    let stats = AggregateStats::from_entries(entries);

    md.push_str(&format!("# {}\n\n", options.title));
    md.push_str(&format!(
        "**Generated:** {}\n\n",
        options.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str("---\n\n");

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Total Scans | {} |\n", stats.total_scans));
    md.push_str(&format!("| Threats Detected | {} |\n", stats.threats_detected));
    md.push_str(&format!("| Clean Results | {} |\n\n", stats.clean_results));

    md.push_str("## Scans\n\n");
    md.push_str("| Target | Type | Verdict | Scanned |\n");
    md.push_str("|--------|------|---------|---------|\n");
    for entry in entries {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&entry.target),
            entry.kind,
            entry.verdict(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    md.push('\n');

    md.push_str("## Details\n\n");
    for entry in entries {
        md.push_str(&format!("### {} ({})\n\n", entry.target, entry.kind));
        let verdicts = provider_verdicts(&entry.result, &options.thresholds);
        if verdicts.is_empty() {
            md.push_str("_No provider data._\n\n");
        } else {
            for v in &verdicts {
                md.push_str(&format!("- **{}:** {} ({})\n", v.label, v.value, v.badge));
            }
            md.push('\n');
        }
        if options.include_raw {
            if let Ok(raw) = serde_json::to_string_pretty(&entry.result) {
                md.push_str("```json\n");
                md.push_str(&raw);
                md.push_str("\n```\n\n");
            }
        }
    }

    if let Some(analysis) = &options.analysis {
        push_analysis(&mut md, analysis);
    }

    md
}

fn push_analysis(md: &mut String, analysis: &AnalysisResult) {
    md.push_str("---\n\n## AI Analysis\n\n");
    md.push_str(&format!("**Risk Level:** {}\n\n", analysis.risk_level));
    if !analysis.attack_surface_summary.is_empty() {
        md.push_str("### Attack Surface\n\n");
        md.push_str(&analysis.attack_surface_summary);
        md.push_str("\n\n");
    }
    for (heading, items) in [
        ("Possible Vulnerabilities", &analysis.possible_vulnerabilities),
        ("Interesting Endpoints", &analysis.interesting_endpoints),
        ("Recommendations", &analysis.security_recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        md.push_str(&format!("### {heading}\n\n"));
        for item in items {
            md.push_str(&format!("- {item}\n"));
        }
        md.push('\n');
    }
    if !analysis.detailed_analysis.is_empty() {
        md.push_str("### Detailed Analysis\n\n");
        md.push_str(&analysis.detailed_analysis);
        md.push_str("\n\n");
    }
}

/// Escape a value for a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
