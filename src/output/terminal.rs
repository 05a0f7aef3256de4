// Colored terminal output for scan results, history and analysis.
//
// This module handles all terminal-specific formatting: colors, tables,
// banners. The main.rs command handlers delegate here.

use chrono::Utc;
use colored::Colorize;

use crate::backend::models::{AnalysisResult, ApiKeys, FeedItem};
use crate::scoring::threat::ThreatThresholds;
use crate::scoring::verdict::{provider_verdicts, Severity};
use crate::session::{AggregateStats, Banner, BannerKind, CurrentScan, HistoryEntry, ViewState};

/// Page title of the active view.
pub fn display_header(view: &ViewState) {
    println!("\n{}", format!("=== {} ===", view.title()).bold());
}

/// The current status banner, if any.
pub fn display_banner(view: &ViewState) {
    if let Some(banner) = view.banner() {
        println!("{}", format_banner(banner));
    }
}

fn format_banner(banner: &Banner) -> colored::ColoredString {
    match banner.kind {
        BannerKind::Error => format!("  x {}", banner.message).red().bold(),
        BannerKind::Info => format!("  i {}", banner.message).cyan(),
        BannerKind::Success => format!("  + {}", banner.message).green(),
    }
}

/// Verdict panel for the scan currently on screen.
pub fn display_scan_result(current: &CurrentScan, thresholds: &ThreatThresholds) {
    let verdict = if current.is_threat {
        "THREAT DETECTED".red().bold()
    } else {
        "CLEAN".green().bold()
    };
    println!(
        "  {} ({})  {}",
        current.target.value.bold(),
        current.target.kind,
        verdict
    );
    println!("  {}", format!("Scan ID: {}", current.scan_id).dimmed());
    if !current.tripped.is_empty() {
        println!("  Tripped by: {}", current.tripped.join(", ").red());
    }
    println!();

    let verdicts = provider_verdicts(&current.result, thresholds);
    if verdicts.is_empty() {
        println!("  {}", "No provider data returned.".dimmed());
        return;
    }
    for v in &verdicts {
        println!(
            "  {:<24} {:<20} {}",
            v.label.dimmed(),
            v.value,
            colorize_severity(&v.badge, v.severity)
        );
    }
}

/// Scan history, most recent first, numbered for `rescan`.
pub fn display_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No scans yet. Run `threatdesk scan <target>` first.");
        return;
    }

    let now = Utc::now();
    println!(
        "  {:>4}  {:<40} {:<7} {:<10} {}",
        "#".dimmed(),
        "Target".dimmed(),
        "Type".dimmed(),
        "Verdict".dimmed(),
        "When".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for (i, entry) in entries.iter().enumerate() {
        let verdict = if entry.is_threat {
            entry.verdict().red().bold()
        } else {
            entry.verdict().green()
        };
        println!(
            "  {:>4}. {:<40} {:<7} {:<10} {}",
            i + 1,
            super::truncate_chars(&entry.target, 37),
            entry.kind.as_str(),
            verdict,
            super::format_relative(entry.timestamp, now).dimmed(),
        );
    }
}

pub fn display_stats(stats: &AggregateStats) {
    println!("  Total scans:      {}", stats.total_scans.to_string().bold());
    println!(
        "  Threats detected: {}",
        stats.threats_detected.to_string().red().bold()
    );
    println!(
        "  Clean results:    {}",
        stats.clean_results.to_string().green()
    );
}

pub fn display_analysis(analysis: &AnalysisResult) {
    println!("  Risk level: {}", colorize_risk(&analysis.risk_level));
    if !analysis.attack_surface_summary.is_empty() {
        println!("\n  {}", "Attack surface".bold());
        println!("    {}", analysis.attack_surface_summary);
    }

    for (heading, items) in [
        ("Possible vulnerabilities", &analysis.possible_vulnerabilities),
        ("Interesting endpoints", &analysis.interesting_endpoints),
        ("Recommendations", &analysis.security_recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("\n  {}", heading.bold());
        for item in items {
            println!("    - {}", item);
        }
    }

    if !analysis.detailed_analysis.is_empty() {
        println!("\n  {}", "Detailed analysis".bold());
        println!("    {}", analysis.detailed_analysis.dimmed());
    }
}

pub fn display_feeds(items: &[FeedItem]) {
    if items.is_empty() {
        println!("  {}", "No feed items available.".dimmed());
        return;
    }
    for item in items {
        println!(
            "  [{}] {}",
            colorize_risk(&item.severity),
            item.title.bold()
        );
        if !item.description.is_empty() {
            println!("      {}", super::truncate_chars(&item.description, 140).dimmed());
        }
        if !item.source.is_empty() || !item.timestamp.is_empty() {
            println!(
                "      {}",
                format!("{} {}", item.source, item.timestamp).trim().dimmed()
            );
        }
    }
}

/// Which provider keys are set, without printing the keys themselves.
pub fn display_api_keys(keys: &ApiKeys) {
    for (name, value) in [
        ("VirusTotal", &keys.virustotal),
        ("AbuseIPDB", &keys.abuseipdb),
        ("AlienVault OTX", &keys.alienvault),
    ] {
        let state = if value.is_empty() {
            "not set".dimmed()
        } else {
            mask_key(value).green()
        };
        println!("  {:<16} {}", name, state);
    }
}

/// Show the last four characters of a key.
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(8), tail)
}

fn colorize_severity(badge: &str, severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Danger => badge.red().bold(),
        Severity::Warning => badge.yellow(),
        Severity::Clean => badge.green(),
    }
}

fn colorize_risk(level: &str) -> colored::ColoredString {
    match level.to_ascii_lowercase().as_str() {
        "critical" | "high" => level.red().bold(),
        "medium" => level.yellow(),
        "low" => level.green(),
        _ => level.dimmed(),
    }
}
