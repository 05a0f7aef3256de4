// HTTP client for the scan and analysis services.
//
// The scan service (`POST /scan`, `GET /feeds`, `GET /health`) fans a target
// out to VirusTotal, AbuseIPDB and AlienVault OTX. The analysis service
// (`POST /analyze/{id}`, `GET /report/{id}`) works from a scan identifier.
// Either base URL may point at the same server.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{
    AnalysisResponse, AnalysisResult, FeedItem, HealthStatus, ScanId, ScanOutcome, ScanRequest,
    ScanResponse,
};
use super::traits::{AnalysisBackend, ScanBackend};
use crate::error::DeskError;

/// Thin reqwest wrapper over both backends.
pub struct HttpBackend {
    client: reqwest::Client,
    scan_url: String,
    analysis_url: String,
}

impl HttpBackend {
    pub fn new(scan_url: &str, analysis_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("threatdesk/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            scan_url: scan_url.trim_end_matches('/').to_string(),
            analysis_url: analysis_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, DeskError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(what, e))?;
        let response = ensure_success(response, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DeskError::Transport(format!("{what}: unreadable response ({e})")))
    }
}

fn transport(what: &str, e: reqwest::Error) -> DeskError {
    warn!(error = %e, "{what} request failed");
    if e.is_timeout() {
        DeskError::Transport(format!("{what} timed out"))
    } else {
        DeskError::Transport(format!("{what} failed: could not reach the backend"))
    }
}

/// Turn a non-2xx response into a Transport error carrying the backend's
/// own message when it sent one.
async fn ensure_success(response: Response, what: &str) -> Result<Response, DeskError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(status = %status, "{what} returned an error: {message}");
    Err(DeskError::Transport(format!("{what} failed: {message}")))
}

/// Pull `error` (Flask) or `detail` (FastAPI) out of an error body.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("detail"))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, DeskError> {
        let url = format!("{}/scan", self.scan_url);
        debug!(scan_target = %request.target, kind = %request.kind, "POST {url}");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport("Scan", e))?;
        let response = ensure_success(response, "Scan").await?;

        let parsed: ScanResponse = response
            .json()
            .await
            .map_err(|e| DeskError::Transport(format!("Scan: unreadable response ({e})")))?;

        parsed
            .into_outcome()
            .map_err(|message| DeskError::Transport(format!("Scan failed: {message}")))
    }

    async fn feeds(&self) -> Result<Vec<FeedItem>, DeskError> {
        let url = format!("{}/feeds", self.scan_url);
        self.get_json(&url, "Feed refresh").await
    }

    async fn health(&self) -> Result<HealthStatus, DeskError> {
        let url = format!("{}/health", self.scan_url);
        self.get_json(&url, "Health check").await
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze(&self, scan_id: &ScanId) -> Result<AnalysisResult, DeskError> {
        let url = format!("{}/analyze/{}", self.analysis_url, scan_id);
        debug!(scan_id = %scan_id, "POST {url}");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| transport("Analysis", e))?;
        let response = ensure_success(response, "Analysis").await?;

        let parsed: AnalysisResponse = response
            .json()
            .await
            .map_err(|e| DeskError::Transport(format!("Analysis: unreadable response ({e})")))?;

        parsed
            .into_result()
            .map_err(|message| DeskError::Transport(format!("Analysis failed: {message}")))
    }

    async fn report(&self, scan_id: &ScanId) -> Result<Vec<u8>, DeskError> {
        let url = format!("{}/report/{}", self.analysis_url, scan_id);
        debug!(scan_id = %scan_id, "GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport("Report download", e))?;
        let response = ensure_success(response, "Report download").await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport("Report download", e))?;
        Ok(bytes.to_vec())
    }
}
