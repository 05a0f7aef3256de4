// Session layer: the client-side state of the dashboard and the controller
// that drives it.

pub mod dashboard;
pub mod history;
pub mod scan;
pub mod settings;
pub mod view;

pub use dashboard::{Dashboard, ScanSummary};
pub use history::{AggregateStats, HistoryEntry, HistoryStore};
pub use scan::{AnalysisTicket, CurrentScan, ScanSession, ScanTicket};
pub use view::{Banner, BannerKind, CosmeticProgress, View, ViewState};
