// Backend traits: the seam between the controller and the network.
//
// HttpBackend implements both traits against the real services. Tests
// substitute in-memory fakes so controller transitions can be exercised
// without a server.

use async_trait::async_trait;

use super::models::{AnalysisResult, FeedItem, HealthStatus, ScanId, ScanOutcome, ScanRequest};
use crate::error::DeskError;

/// Runs scans against the intelligence providers.
#[async_trait]
pub trait ScanBackend: Send + Sync {
    /// Submit one target. Failures come back as `DeskError::Transport`.
    async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, DeskError>;

    /// Latest items of the live threat feed.
    async fn feeds(&self) -> Result<Vec<FeedItem>, DeskError> {
        Ok(Vec::new())
    }

    /// Liveness of the scan service.
    async fn health(&self) -> Result<HealthStatus, DeskError>;
}

/// Analyzes completed scans and renders their reports.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, scan_id: &ScanId) -> Result<AnalysisResult, DeskError>;

    /// PDF report for a scan that has already been analyzed.
    async fn report(&self, scan_id: &ScanId) -> Result<Vec<u8>, DeskError>;
}

/// Stand-in when no analysis service is configured.
pub struct NoopAnalysis;

#[async_trait]
impl AnalysisBackend for NoopAnalysis {
    async fn analyze(&self, _scan_id: &ScanId) -> Result<AnalysisResult, DeskError> {
        Err(DeskError::Transport(
            "No analysis backend configured (set THREATDESK_ANALYSIS_URL)".to_string(),
        ))
    }

    async fn report(&self, _scan_id: &ScanId) -> Result<Vec<u8>, DeskError> {
        Err(DeskError::Transport(
            "No analysis backend configured (set THREATDESK_ANALYSIS_URL)".to_string(),
        ))
    }
}
