// System status display: storage, history counters, keys, backend health.

use std::path::Path;

use colored::Colorize;

use crate::config::Config;
use crate::output::format_relative;
use crate::session::Dashboard;

/// Display system status to the terminal.
///
/// With `ephemeral` set the history lives in memory only, so the database
/// file is not reported.
pub async fn show(dashboard: &Dashboard, config: &Config, ephemeral: bool) {
    println!("Database: {}", database_line(config, ephemeral));


    let stats = dashboard.stats();
    println!(
        "History: {} scans, {} threats, {} clean",
        stats.total_scans, stats.threats_detected, stats.clean_results
    );
    match dashboard.history().latest() {
        Some(entry) => println!(
            "Last scan: {} ({})",
            entry.target,
            format_relative(entry.timestamp, chrono::Utc::now())
        ),
        None => {
            println!("Last scan: never");
            println!("  Run `threatdesk scan <target>` to start");
        }
    }

    let keys = dashboard.effective_keys().configured();
    if keys.is_empty() {
        println!("API keys: none configured");
        println!("  Run `threatdesk keys set` or add them to your .env file");
    } else {
        println!("API keys: {}", keys.join(", "));
    }

    let t = dashboard.thresholds();
    println!(
        "Thresholds: malicious > {}, abuse confidence > {}, pulses > {}",
        t.malicious_engines, t.abuse_confidence, t.otx_pulses
    );

    // Backend health
    match dashboard.health().await {
        Ok(health) if health.is_healthy() => {
            println!("Scan backend: {} {}", config.scan_url, "healthy".green());
        }
        Ok(health) => {
            println!(
                "Scan backend: {} {}",
                config.scan_url,
                health.status.as_str().yellow()
            );
        }
        Err(e) => {
            println!("Scan backend: {} {}", config.scan_url, "unreachable".red());
            println!("  {}", e.to_string().dimmed());
        }
    }
    if config.has_analysis_backend() {
        println!("Analysis backend: {}", config.analysis_url);
    } else {
        println!("Analysis backend: not configured");
    }
}

fn database_line(config: &Config, ephemeral: bool) -> String {
    if ephemeral {
        return "in memory (--ephemeral, nothing is saved)".to_string();
    }
    if !Path::new(&config.db_path).exists() {
        return format!("{} (not created yet)", config.db_path);
    }
    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{} ({})", config.db_path, file_size)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(db_path: &str) -> Config {
        Config {
            scan_url: crate::config::DEFAULT_SCAN_URL.to_string(),
            analysis_url: String::new(),
            db_path: db_path.to_string(),
            env_keys: Default::default(),
            thresholds: Default::default(),
            timeout: std::time::Duration::from_secs(30),
        }
    }

    #[test]
    fn test_ephemeral_does_not_report_db_file() {
        let config = config_at("/nonexistent/threatdesk.db");
        let line = database_line(&config, true);
        assert!(line.starts_with("in memory"));
        assert!(!line.contains("/nonexistent"));
    }

    #[test]
    fn test_missing_db_file() {
        let config = config_at("/nonexistent/threatdesk.db");
        assert_eq!(
            database_line(&config, false),
            "/nonexistent/threatdesk.db (not created yet)"
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
