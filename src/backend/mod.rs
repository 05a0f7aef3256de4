// Backends: the scan, analysis and report services the dashboard talks to.
//
// The services are opaque collaborators. ScanBackend and AnalysisBackend
// are the only contract the controller depends on; HttpBackend is the
// production implementation.

pub mod http;
pub mod models;
pub mod traits;

pub use http::HttpBackend;
pub use models::{
    AnalysisResult, ApiKeys, FeedItem, HealthStatus, ScanId, ScanMetadata, ScanOutcome,
    ScanRequest, ScanResult,
};
pub use traits::{AnalysisBackend, NoopAnalysis, ScanBackend};
