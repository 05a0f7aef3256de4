use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use threatdesk::backend::{AnalysisBackend, ApiKeys, HttpBackend, NoopAnalysis};
use threatdesk::config::Config;
use threatdesk::export::{self, ExportFormat};
use threatdesk::output::terminal;
use threatdesk::session::{Dashboard, ScanSummary, View};
use threatdesk::store::{self, KeyValueStore, MemoryStore};
use threatdesk::target::TargetKind;

/// threatdesk: threat-intelligence lookups from the terminal.
///
/// Scans IPs, domains, URLs and file hashes against VirusTotal, AbuseIPDB
/// and AlienVault OTX through a scan service, keeps a local history and
/// exports reports.
#[derive(Parser)]
#[command(name = "threatdesk", version, about)]
struct Cli {
    /// Keep history and settings in memory only for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a target (IP, domain, URL or hash)
    Scan {
        /// The target to scan
        target: String,

        /// Target type (ip, domain, url, hash). Detected when omitted.
        #[arg(long = "type")]
        kind: Option<TargetKind>,

        /// Request an AI analysis of the scan afterwards
        #[arg(long)]
        analyze: bool,

        /// Export the history in this format after the scan (md, csv, json)
        #[arg(long)]
        export: Option<ExportFormat>,

        /// Download the backend's PDF report for this scan
        #[arg(long)]
        report: bool,
    },

    /// List previous scans, most recent first
    History,

    /// Show scan counters
    Stats,

    /// Export the scan history
    Export {
        /// Output format (md, csv, json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output file (default: threatdesk-report-<timestamp>.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Leave raw provider payloads out of the export
        #[arg(long)]
        no_raw: bool,
    },

    /// Re-run a scan from the history (1 is the most recent)
    Rescan {
        index: usize,
    },

    /// Discard the scan history and reset the counters
    Clear,

    /// Show the live threat feed
    Feeds,

    /// Manage provider API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Show system status (storage, counters, keys, backend health)
    Status,
}

#[derive(Subcommand)]
enum KeysAction {
    /// Save keys. Providers not given keep their current key.
    Set {
        #[arg(long)]
        virustotal: Option<String>,
        #[arg(long)]
        abuseipdb: Option<String>,
        #[arg(long)]
        alienvault: Option<String>,
    },
    /// Show which providers have a key
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("threatdesk=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let mut dashboard = open_dashboard(&config, cli.ephemeral).await?;

    match cli.command {
        Commands::Scan {
            target,
            kind,
            analyze,
            export,
            report,
        } => {
            config.require_scan_backend()?;
            if analyze || report {
                config.require_analysis_backend()?;
            }

            let summary = run_scan(&mut dashboard, &target, kind).await?;
            show_scan(&dashboard);
            println!();
            terminal::display_stats(&summary.stats);

            if analyze {
                println!("\nRequesting AI analysis...");
                let analysis = dashboard.analyze().await?;
                terminal::display_header(dashboard.view());
                terminal::display_analysis(&analysis);
            }

            if report {
                let pdf = dashboard.download_report().await?;
                let path = PathBuf::from(format!("threatdesk-report-{}.pdf", summary.scan_id));
                std::fs::write(&path, &pdf)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("\nReport saved to {}", path.display());
            }

            if let Some(format) = export {
                let path = write_export(&mut dashboard, format, None, true)?;
                println!("\nExported history to {}", path.display());
            }
        }

        Commands::History => {
            dashboard.set_view(View::History);
            terminal::display_header(dashboard.view());
            terminal::display_history(dashboard.history().entries());
        }

        Commands::Stats => {
            dashboard.set_view(View::Overview);
            terminal::display_header(dashboard.view());
            terminal::display_stats(&dashboard.stats());
        }

        Commands::Export {
            format,
            out,
            no_raw,
        } => {
            dashboard.set_view(View::Reports);
            let path = write_export(&mut dashboard, format, out, !no_raw)?;
            println!(
                "Exported {} scans to {}",
                dashboard.history().len(),
                path.display()
            );
        }

        Commands::Rescan { index } => {
            config.require_scan_backend()?;
            if index == 0 {
                anyhow::bail!("History positions start at 1. Run `threatdesk history` to list them.");
            }
            let spinner = ProgressBar::new_spinner();
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message("Rescanning...");
            let result = dashboard.rescan(index - 1).await;
            spinner.finish_and_clear();
            let summary = result?;
            show_scan(&dashboard);
            println!();
            terminal::display_stats(&summary.stats);
        }

        Commands::Clear => {
            let discarded = dashboard.history().len();
            dashboard.clear_history().await?;
            terminal::display_banner(dashboard.view());
            info!(discarded, "History cleared");
        }

        Commands::Feeds => {
            config.require_scan_backend()?;
            dashboard.refresh_feeds().await?;
            terminal::display_header(dashboard.view());
            terminal::display_feeds(dashboard.feeds());
        }

        Commands::Keys { action } => {
            dashboard.set_view(View::Settings);
            match action {
                KeysAction::Set {
                    virustotal,
                    abuseipdb,
                    alienvault,
                } => {
                    let current = dashboard.api_keys().clone();
                    let keys = ApiKeys {
                        virustotal: virustotal.unwrap_or(current.virustotal),
                        abuseipdb: abuseipdb.unwrap_or(current.abuseipdb),
                        alienvault: alienvault.unwrap_or(current.alienvault),
                    };
                    dashboard.save_api_keys(keys).await?;
                    terminal::display_banner(dashboard.view());
                    terminal::display_api_keys(dashboard.api_keys());
                }
                KeysAction::Show => {
                    terminal::display_header(dashboard.view());
                    println!("  {}", "Saved:".bold());
                    terminal::display_api_keys(dashboard.api_keys());
                    println!("\n  {}", "In use (saved, then environment):".bold());
                    terminal::display_api_keys(&dashboard.effective_keys());
                }
            }
        }

        Commands::Status => {
            threatdesk::status::show(&dashboard, &config, cli.ephemeral).await;
        }
    }

    Ok(())
}

/// Build the dashboard over the configured backends and store.
async fn open_dashboard(config: &Config, ephemeral: bool) -> Result<Dashboard> {
    let http = Arc::new(HttpBackend::new(
        &config.scan_url,
        &config.analysis_url,
        config.timeout,
    )?);
    let analyzer: Arc<dyn AnalysisBackend> = if config.has_analysis_backend() {
        http.clone()
    } else {
        Arc::new(NoopAnalysis)
    };
    let store: Arc<dyn KeyValueStore> = if ephemeral {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(store::open_sqlite(&config.db_path)?)
    };

    Ok(Dashboard::open(
        http,
        analyzer,
        store,
        config.thresholds,
        config.env_keys.clone(),
    )
    .await)
}

/// Run one scan with a progress bar driven by the dashboard's cosmetic
/// progress while the backend call is pending.
async fn run_scan(
    dashboard: &mut Dashboard,
    target: &str,
    kind: Option<TargetKind>,
) -> Result<ScanSummary> {
    let ticket = dashboard.begin_scan(target, kind)?;
    info!(scan_target = %ticket.target.value, kind = %ticket.target.kind, "Scanning");

    let pb = ProgressBar::new(100);
    pb.set_style(ProgressStyle::default_bar().template("  Scanning [{bar:30}] {pos}% {msg}")?);

    let scanner = dashboard.scanner();
    let outcome = {
        let call = scanner.scan(&ticket.request);
        tokio::pin!(call);
        let mut ticker = tokio::time::interval(Duration::from_millis(400));
        loop {
            tokio::select! {
                outcome = &mut call => break outcome,
                _ = ticker.tick() => {
                    dashboard.tick(Instant::now());
                    if let Some(progress) = dashboard.view().progress() {
                        pb.set_position(progress.percent() as u64);
                        pb.set_message(progress.message());
                    }
                }
            }
        }
    };

    let result = dashboard.complete_scan(ticket, outcome).await;
    if let Some(progress) = dashboard.view().progress() {
        pb.set_position(progress.percent() as u64);
        pb.set_message(progress.message());
    }
    pb.finish_and_clear();
    Ok(result?)
}

/// Print the scan view: title, banner, verdict panel.
fn show_scan(dashboard: &Dashboard) {
    terminal::display_header(dashboard.view());
    terminal::display_banner(dashboard.view());
    if let Some(current) = dashboard.current() {
        terminal::display_scan_result(current, dashboard.thresholds());
    }
}

fn write_export(
    dashboard: &mut Dashboard,
    format: ExportFormat,
    out: Option<PathBuf>,
    include_raw: bool,
) -> Result<PathBuf> {
    let mut options = dashboard.export_options();
    options.include_raw = include_raw;
    let bytes = dashboard.export(format, &options)?;

    let path = out.unwrap_or_else(|| PathBuf::from(export::file_name(format, options.generated_at)));
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), format = %format, bytes = bytes.len(), "Export written");
    Ok(path)
}
