// Scan and analysis request lifecycle.
//
// Each request is split into a synchronous `begin_*` transition that hands
// out a ticket, the awaited backend call, and a `finish_*` transition that
// takes the ticket back. Every new scan bumps the generation, so a ticket
// from an older generation is recognised as stale when it comes back.

use tracing::{debug, info};

use crate::backend::models::{AnalysisResult, ApiKeys, ScanId, ScanOutcome, ScanRequest, ScanResult};
use crate::error::DeskError;
use crate::scoring::threat::{tripped_providers, ThreatThresholds};
use crate::target::Target;

/// Permission to run one scan. Returned to `finish_scan`.
#[derive(Debug, Clone)]
pub struct ScanTicket {
    generation: u64,
    pub target: Target,
    pub request: ScanRequest,
}

/// Permission to run one analysis of `scan_id`.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    generation: u64,
    pub scan_id: ScanId,
}

/// The scan whose results are currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentScan {
    pub scan_id: ScanId,
    pub target: Target,
    pub result: ScanResult,
    pub is_threat: bool,
    /// Providers that tripped the threat rule.
    pub tripped: Vec<&'static str>,
}

#[derive(Debug, Default)]
pub struct ScanSession {
    generation: u64,
    scan_pending: bool,
    analysis_pending: bool,
    current: Option<CurrentScan>,
    analysis: Option<AnalysisResult>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scan. Rejected while another scan is pending. Invalidates the
    /// current scan id and any analysis in flight for it.
    pub fn begin_scan(&mut self, target: Target, api_keys: ApiKeys) -> Result<ScanTicket, DeskError> {
        if self.scan_pending {
            return Err(DeskError::ScanInProgress);
        }

        self.generation += 1;
        self.scan_pending = true;
        self.analysis_pending = false;
        self.current = None;
        self.analysis = None;

        debug!(generation = self.generation, scan_target = %target, "Scan started");

        Ok(ScanTicket {
            generation: self.generation,
            request: ScanRequest {
                target: target.value.clone(),
                kind: target.kind,
                api_keys,
            },
            target,
        })
    }

    /// Resolve a scan. On success the result becomes current and is
    /// classified; on failure nothing but the pending flag changes.
    pub fn finish_scan(
        &mut self,
        ticket: ScanTicket,
        outcome: Result<ScanOutcome, DeskError>,
        thresholds: &ThreatThresholds,
    ) -> Result<&CurrentScan, DeskError> {
        if ticket.generation != self.generation {
            debug!(ticket = ticket.generation, current = self.generation, "Dropping stale scan");
            return Err(DeskError::Superseded {
                scan_id: outcome
                    .map(|o| o.scan_id.to_string())
                    .unwrap_or_else(|_| "<failed>".to_string()),
            });
        }
        self.scan_pending = false;

        let outcome = outcome?;
        let tripped = tripped_providers(&outcome.result, thresholds);
        let is_threat = !tripped.is_empty();
        info!(
            scan_id = %outcome.scan_id,
            scan_target = %ticket.target,
            is_threat,
            tripped = ?tripped,
            "Scan completed"
        );

        Ok(self.current.insert(CurrentScan {
            scan_id: outcome.scan_id,
            target: ticket.target,
            result: outcome.result,
            is_threat,
            tripped,
        }))
    }

    /// Start an analysis of the current scan.
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, DeskError> {
        let scan_id = match &self.current {
            Some(current) => current.scan_id.clone(),
            None => return Err(DeskError::NoActiveScan),
        };
        if self.analysis_pending {
            return Err(DeskError::AnalysisInProgress);
        }
        self.analysis_pending = true;
        Ok(AnalysisTicket {
            generation: self.generation,
            scan_id,
        })
    }

    /// Resolve an analysis. Results for a scan that is no longer current are
    /// discarded with `Superseded`.
    pub fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
        result: Result<AnalysisResult, DeskError>,
    ) -> Result<&AnalysisResult, DeskError> {
        let still_current = ticket.generation == self.generation
            && self
                .current
                .as_ref()
                .is_some_and(|c| c.scan_id == ticket.scan_id);
        if !still_current {
            debug!(scan_id = %ticket.scan_id, "Dropping analysis for superseded scan");
            return Err(DeskError::Superseded {
                scan_id: ticket.scan_id.to_string(),
            });
        }

        self.analysis_pending = false;
        let analysis = result?;
        info!(scan_id = %ticket.scan_id, risk = %analysis.risk_level, "Analysis completed");
        Ok(self.analysis.insert(analysis))
    }

    /// Drop the current scan result without starting a new scan. Used when
    /// the result could not be recorded.
    pub fn discard_current(&mut self) {
        self.generation += 1;
        self.analysis_pending = false;
        self.current = None;
        self.analysis = None;
    }

    /// Forget the current scan ("new scan"). Outstanding tickets go stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.scan_pending = false;
        self.analysis_pending = false;
        self.current = None;
        self.analysis = None;
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_pending
    }

    pub fn is_analyzing(&self) -> bool {
        self.analysis_pending
    }

    pub fn current(&self) -> Option<&CurrentScan> {
        self.current.as_ref()
    }

    pub fn scan_id(&self) -> Option<&ScanId> {
        self.current.as_ref().map(|c| &c.scan_id)
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }
}
