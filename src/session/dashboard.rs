// Dashboard controller.
//
// Owns the whole client state (scan session, history, views, settings) and
// is the only thing that mutates it. Backend calls are awaited between a
// `begin_*` and a `complete_*` transition so a renderer can keep drawing
// progress while a request is pending.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use super::history::{AggregateStats, HistoryEntry, HistoryStore};
use super::scan::{AnalysisTicket, CurrentScan, ScanSession, ScanTicket};
use super::settings;
use super::view::{BannerKind, View, ViewState};
use crate::backend::models::{
    AnalysisResult, ApiKeys, FeedItem, HealthStatus, ScanId, ScanOutcome,
};
use crate::backend::traits::{AnalysisBackend, ScanBackend};
use crate::error::DeskError;
use crate::export::{self, ExportFormat, ExportOptions};
use crate::scoring::threat::ThreatThresholds;
use crate::store::KeyValueStore;
use crate::target::{Target, TargetKind};

/// What a completed scan did to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub scan_id: ScanId,
    pub target: Target,
    pub is_threat: bool,
    pub tripped: Vec<&'static str>,
    pub stats: AggregateStats,
}

pub struct Dashboard {
    scanner: Arc<dyn ScanBackend>,
    analyzer: Arc<dyn AnalysisBackend>,
    store: Arc<dyn KeyValueStore>,
    thresholds: ThreatThresholds,
    /// Keys from the environment, used for any provider left blank in settings.
    env_keys: ApiKeys,
    api_keys: ApiKeys,
    session: ScanSession,
    history: HistoryStore,
    view: ViewState,
    feeds: Vec<FeedItem>,
}

impl Dashboard {
    /// Build a dashboard and restore history and settings from `store`.
    pub async fn open(
        scanner: Arc<dyn ScanBackend>,
        analyzer: Arc<dyn AnalysisBackend>,
        store: Arc<dyn KeyValueStore>,
        thresholds: ThreatThresholds,
        env_keys: ApiKeys,
    ) -> Self {
        let history = HistoryStore::load(store.as_ref()).await;
        let api_keys = settings::load_api_keys(store.as_ref()).await;
        info!(
            entries = history.len(),
            keys = ?api_keys.configured(),
            "Dashboard opened"
        );

        Self {
            scanner,
            analyzer,
            store,
            thresholds,
            env_keys,
            api_keys,
            session: ScanSession::new(),
            history,
            view: ViewState::new(),
            feeds: Vec::new(),
        }
    }

    // --- Views ---

    pub fn set_view(&mut self, view: View) -> &'static str {
        self.view.enter(view)
    }

    /// Housekeeping on a timer: expire the banner and advance the cosmetic
    /// progress while a scan is pending.
    pub fn tick(&mut self, now: Instant) {
        self.view.expire_banner(now);
        if self.session.is_scanning() {
            self.view.tick_progress();
        }
    }

    // --- Scanning ---

    /// Validate `input` and reserve the scan slot. With no `kind` the kind is
    /// detected from the input.
    pub fn begin_scan(
        &mut self,
        input: &str,
        kind: Option<TargetKind>,
    ) -> Result<ScanTicket, DeskError> {
        let target = match kind {
            Some(kind) => Target::parse(input, kind),
            None => Target::detect(input),
        };
        let target = match target {
            Ok(target) => target,
            Err(e) => return self.surface(e),
        };

        let keys = self.effective_keys();
        let ticket = match self.session.begin_scan(target, keys) {
            Ok(ticket) => ticket,
            Err(e) => return self.surface(e),
        };

        self.view.clear_banner();
        self.view.set_scanning(true);
        self.view.set_analyzing(false);
        self.view.start_progress();
        Ok(ticket)
    }

    /// Apply the backend's answer to a scan started with `begin_scan`.
    ///
    /// On success the scan is appended to the history and persisted before
    /// returning. If the backend fails, or the entry cannot be persisted,
    /// history, counters and the active view are untouched and no current
    /// scan is held.
    pub async fn complete_scan(
        &mut self,
        ticket: ScanTicket,
        outcome: Result<ScanOutcome, DeskError>,
    ) -> Result<ScanSummary, DeskError> {
        let current = match self.session.finish_scan(ticket, outcome, &self.thresholds) {
            Ok(current) => current.clone(),
            Err(e @ DeskError::Superseded { .. }) => return Err(e),
            Err(e) => {
                self.view.set_scanning(false);
                self.view.clear_progress();
                return self.surface(e);
            }
        };

        self.view.set_scanning(false);

        let entry = HistoryEntry::new(
            current.target.value.clone(),
            current.target.kind,
            current.result.clone(),
            current.is_threat,
            Utc::now(),
        );
        if let Err(e) = self.history.append(entry, self.store.as_ref()).await {
            warn!(error = %e, scan_id = %current.scan_id, "Scan result could not be saved, discarding it");
            self.session.discard_current();
            self.view.clear_progress();
            return self.surface(e);
        }

        self.view.complete_progress();
        self.view.enter(View::Scan);
        self.view
            .raise(BannerKind::Success, "Scan completed successfully!", Instant::now());

        Ok(self.summary(&current))
    }

    /// Validate, scan and record in one call.
    pub async fn scan(
        &mut self,
        input: &str,
        kind: Option<TargetKind>,
    ) -> Result<ScanSummary, DeskError> {
        let ticket = self.begin_scan(input, kind)?;
        let scanner = Arc::clone(&self.scanner);
        let outcome = scanner.scan(&ticket.request).await;
        self.complete_scan(ticket, outcome).await
    }

    /// Re-run the scan recorded at `index` (0 is the most recent).
    pub async fn rescan(&mut self, index: usize) -> Result<ScanSummary, DeskError> {
        let Some(entry) = self.history.get(index) else {
            return self.surface(DeskError::validation(
                &index.to_string(),
                None,
                format!("No scan at history position {}", index + 1),
            ));
        };
        let (target, kind) = (entry.target.clone(), entry.kind);

        let ticket = self.begin_scan(&target, Some(kind))?;
        info!(scan_target = %target, index, "Rescanning history entry");
        self.view.enter(View::Overview);

        let scanner = Arc::clone(&self.scanner);
        let outcome = scanner.scan(&ticket.request).await;
        self.complete_scan(ticket, outcome).await
    }

    /// Forget the current scan and its analysis. A pending result for it
    /// will be discarded when it arrives.
    pub fn reset(&mut self) {
        self.session.reset();
        self.view.set_scanning(false);
        self.view.set_analyzing(false);
        self.view.clear_progress();
        self.view.clear_banner();
        self.view.enter(View::Overview);
    }

    // --- Analysis ---

    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, DeskError> {
        match self.session.begin_analysis() {
            Ok(ticket) => {
                self.view.set_analyzing(true);
                Ok(ticket)
            }
            Err(e) => self.surface(e),
        }
    }

    /// Apply an analysis result. Results for a scan that has since been
    /// replaced are dropped without any visible change.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        result: Result<AnalysisResult, DeskError>,
    ) -> Result<AnalysisResult, DeskError> {
        match self.session.finish_analysis(ticket, result) {
            Ok(analysis) => {
                let analysis = analysis.clone();
                self.view.set_analyzing(false);
                self.view.enter(View::Reports);
                self.view
                    .raise(BannerKind::Success, "AI analysis completed", Instant::now());
                Ok(analysis)
            }
            Err(e @ DeskError::Superseded { .. }) => Err(e),
            Err(e) => {
                self.view.set_analyzing(false);
                self.surface(e)
            }
        }
    }

    pub async fn analyze(&mut self) -> Result<AnalysisResult, DeskError> {
        let ticket = self.begin_analysis()?;
        let analyzer = Arc::clone(&self.analyzer);
        let result = analyzer.analyze(&ticket.scan_id).await;
        self.complete_analysis(ticket, result)
    }

    /// Fetch the backend's PDF report for the current scan.
    pub async fn download_report(&mut self) -> Result<Vec<u8>, DeskError> {
        let Some(scan_id) = self.session.scan_id().cloned() else {
            return self.surface(DeskError::NoActiveScan);
        };
        let analyzer = Arc::clone(&self.analyzer);
        match analyzer.report(&scan_id).await {
            Ok(pdf) => {
                info!(scan_id = %scan_id, bytes = pdf.len(), "Report downloaded");
                Ok(pdf)
            }
            Err(e) => self.surface(e),
        }
    }

    // --- History, export, settings, feeds ---

    /// Export options seeded with the current analysis and thresholds.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            analysis: self.session.analysis().cloned(),
            thresholds: self.thresholds,
            ..ExportOptions::default()
        }
    }

    /// Render the whole history. Nothing in the dashboard changes except a
    /// banner when there is nothing to export.
    pub fn export(
        &mut self,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, DeskError> {
        match export::export(self.history.entries(), format, options) {
            Ok(bytes) => Ok(bytes),
            Err(e) => self.surface(e),
        }
    }

    pub async fn clear_history(&mut self) -> Result<(), DeskError> {
        match self.history.clear(self.store.as_ref()).await {
            Ok(()) => {
                self.view
                    .raise(BannerKind::Info, "Scan history cleared", Instant::now());
                Ok(())
            }
            Err(e) => self.surface(e),
        }
    }

    pub async fn save_api_keys(&mut self, keys: ApiKeys) -> Result<(), DeskError> {
        if let Err(e) = settings::save_api_keys(self.store.as_ref(), &keys).await {
            return self.surface(e);
        }
        self.api_keys = keys;
        self.view
            .raise(BannerKind::Success, "API keys saved successfully", Instant::now());
        Ok(())
    }

    /// Switch to the feeds view and reload the feed.
    pub async fn refresh_feeds(&mut self) -> Result<&[FeedItem], DeskError> {
        self.view.enter(View::Feeds);
        let scanner = Arc::clone(&self.scanner);
        match scanner.feeds().await {
            Ok(items) => {
                info!(items = items.len(), "Threat feeds refreshed");
                self.feeds = items;
                Ok(&self.feeds)
            }
            Err(e) => self.surface(e),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, DeskError> {
        self.scanner.health().await
    }

    // --- Accessors ---

    /// The scan backend, for callers that drive `begin_scan`/`complete_scan`
    /// themselves.
    pub fn scanner(&self) -> Arc<dyn ScanBackend> {
        Arc::clone(&self.scanner)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn stats(&self) -> AggregateStats {
        self.history.stats()
    }

    pub fn current(&self) -> Option<&CurrentScan> {
        self.session.current()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.session.analysis()
    }

    pub fn feeds(&self) -> &[FeedItem] {
        &self.feeds
    }

    pub fn thresholds(&self) -> &ThreatThresholds {
        &self.thresholds
    }

    /// Keys saved in settings.
    pub fn api_keys(&self) -> &ApiKeys {
        &self.api_keys
    }

    /// Keys sent with a scan: saved settings, then the environment.
    pub fn effective_keys(&self) -> ApiKeys {
        self.api_keys.clone().or(&self.env_keys)
    }

    fn summary(&self, current: &CurrentScan) -> ScanSummary {
        ScanSummary {
            scan_id: current.scan_id.clone(),
            target: current.target.clone(),
            is_threat: current.is_threat,
            tripped: current.tripped.clone(),
            stats: self.history.stats(),
        }
    }

    /// Raise a banner for a user-visible error and hand it back.
    fn surface<T>(&mut self, err: DeskError) -> Result<T, DeskError> {
        if err.is_user_visible() {
            self.view
                .raise(BannerKind::Error, err.to_string(), Instant::now());
        }
        Err(err)
    }
}
