// View state machine and transient UI flags.
//
// Exactly one view is active. Any view can be entered from any other.
// The transient flags (scanning, analyzing, banner, progress) are
// independent of the active view.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::debug;

/// How long a banner stays up before it clears itself.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Overview,
    Scan,
    Feeds,
    History,
    Reports,
    Settings,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Overview,
        View::Scan,
        View::Feeds,
        View::History,
        View::Reports,
        View::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Threat Intelligence Dashboard",
            View::Scan => "Scan Results",
            View::Feeds => "Live Threat Feeds",
            View::History => "Scan History",
            View::Reports => "Reports",
            View::Settings => "Settings",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Scan => "scan",
            View::Feeds => "feeds",
            View::History => "history",
            View::Reports => "reports",
            View::Settings => "settings",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown view '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Info,
    Success,
}

/// A transient status message.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub raised_at: Instant,
}

impl Banner {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= BANNER_TTL
    }
}

/// Placeholder progress shown while a scan is pending.
///
/// Purely cosmetic: it advances on a timer, stalls at 95% and only reaches
/// 100% when the real result arrives. It says nothing about backend progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmeticProgress {
    percent: u8,
}

const PROGRESS_START: u8 = 10;
const PROGRESS_STEP: u8 = 7;
const PROGRESS_CEILING: u8 = 95;

const PROGRESS_STAGES: [&str; 6] = [
    "Querying intelligence providers...",
    "Checking reputation databases...",
    "Collecting threat pulses...",
    "Resolving geolocation...",
    "Correlating results...",
    "Finalizing scan...",
];

impl CosmeticProgress {
    pub fn start() -> Self {
        Self {
            percent: PROGRESS_START,
        }
    }

    pub fn tick(&mut self) {
        self.percent = self
            .percent
            .saturating_add(PROGRESS_STEP)
            .min(PROGRESS_CEILING);
    }

    pub fn complete(&mut self) {
        self.percent = 100;
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn message(&self) -> &'static str {
        if self.percent >= 100 {
            return "Scan completed successfully!";
        }
        let span = (PROGRESS_CEILING - PROGRESS_START) as usize;
        let done = self.percent.saturating_sub(PROGRESS_START) as usize;
        let idx = (done * PROGRESS_STAGES.len() / span).min(PROGRESS_STAGES.len() - 1);
        PROGRESS_STAGES[idx]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    active: View,
    scanning: bool,
    analyzing: bool,
    banner: Option<Banner>,
    progress: Option<CosmeticProgress>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `view` and return its page title.
    pub fn enter(&mut self, view: View) -> &'static str {
        if self.active != view {
            debug!(from = %self.active, to = %view, "View change");
        }
        self.active = view;
        view.title()
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn title(&self) -> &'static str {
        self.active.title()
    }

    pub fn is_visible(&self, view: View) -> bool {
        self.active == view
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn set_analyzing(&mut self, analyzing: bool) {
        self.analyzing = analyzing;
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Replace the current banner.
    pub fn raise(&mut self, kind: BannerKind, message: impl Into<String>, now: Instant) {
        self.banner = Some(Banner {
            kind,
            message: message.into(),
            raised_at: now,
        });
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    /// Drop the banner once its time is up. Returns true if one was cleared.
    pub fn expire_banner(&mut self, now: Instant) -> bool {
        if self.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.banner = None;
            return true;
        }
        false
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn start_progress(&mut self) {
        self.progress = Some(CosmeticProgress::start());
    }

    pub fn tick_progress(&mut self) {
        if let Some(progress) = self.progress.as_mut() {
            progress.tick();
        }
    }

    pub fn complete_progress(&mut self) {
        if let Some(progress) = self.progress.as_mut() {
            progress.complete();
        }
    }

    pub fn clear_progress(&mut self) {
        self.progress = None;
    }

    pub fn progress(&self) -> Option<&CosmeticProgress> {
        self.progress.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_transition_is_allowed() {
        let mut state = ViewState::new();
        for from in View::ALL {
            for to in View::ALL {
                state.enter(from);
                let title = state.enter(to);
                assert_eq!(state.active(), to);
                assert_eq!(title, to.title());
                assert_eq!(View::ALL.iter().filter(|v| state.is_visible(**v)).count(), 1);
            }
        }
    }

    #[test]
    fn test_flags_survive_view_changes() {
        let mut state = ViewState::new();
        state.set_scanning(true);
        state.start_progress();
        state.raise(BannerKind::Error, "Scan failed", Instant::now());
        state.enter(View::Settings);
        assert!(state.is_scanning());
        assert!(state.progress().is_some());
        assert!(state.banner().is_some());
    }

    #[test]
    fn test_banner_expires_after_ttl() {
        let mut state = ViewState::new();
        let raised = Instant::now();
        state.raise(BannerKind::Error, "Invalid input format", raised);

        assert!(!state.expire_banner(raised + Duration::from_secs(4)));
        assert!(state.banner().is_some());
        assert!(state.expire_banner(raised + BANNER_TTL));
        assert!(state.banner().is_none());
    }

    #[test]
    fn test_progress_stalls_below_completion() {
        let mut progress = CosmeticProgress::start();
        for _ in 0..100 {
            progress.tick();
        }
        assert_eq!(progress.percent(), 95);
        assert_eq!(progress.message(), "Finalizing scan...");
        progress.complete();
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_view_parse() {
        assert_eq!("History".parse::<View>().unwrap(), View::History);
        assert!("dashboard2".parse::<View>().is_err());
    }
}
