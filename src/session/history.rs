// Scan history: most-recent-first log of completed scans plus counters.
//
// Entries are immutable once recorded. The counters are updated
// incrementally on every append and always agree with a full recount of
// the entries. Loading never fails: absent or corrupt persisted data comes
// back as an empty history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::models::ScanResult;
use crate::error::DeskError;
use crate::store::KeyValueStore;
use crate::target::TargetKind;

pub const HISTORY_KEY: &str = "history.entries";
pub const STATS_KEY: &str = "history.stats";

/// A persisted record of one completed scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub result: ScanResult,
    pub timestamp: DateTime<Utc>,
    pub is_threat: bool,
}

impl HistoryEntry {
    pub fn new(
        target: impl Into<String>,
        kind: TargetKind,
        result: ScanResult,
        is_threat: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            target: target.into(),
            kind,
            result,
            timestamp,
            is_threat,
        }
    }

    pub fn verdict(&self) -> &'static str {
        if self.is_threat {
            "Malicious"
        } else {
            "Clean"
        }
    }
}

/// Derived counters over the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_scans: u64,
    pub threats_detected: u64,
    pub clean_results: u64,
}

impl AggregateStats {
    /// Count one more scan.
    pub fn record(&mut self, is_threat: bool) {
        self.total_scans += 1;
        if is_threat {
            self.threats_detected += 1;
        } else {
            self.clean_results += 1;
        }
    }

    /// Recount from scratch.
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.record(entry.is_threat);
        }
        stats
    }

    pub fn is_consistent(&self) -> bool {
        self.total_scans == self.threats_detected + self.clean_results
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    stats: AggregateStats,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from storage. Missing or malformed data yields an empty store.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        let entries_json = match store.get(HISTORY_KEY).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Could not read scan history, starting empty");
                return Self::new();
            }
        };
        let stats_json = store.get(STATS_KEY).await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not read scan stats, recounting");
            None
        });

        match Self::decode(entries_json.as_deref(), stats_json.as_deref()) {
            Ok(history) => {
                debug!(entries = history.len(), "Scan history loaded");
                history
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable scan history");
                Self::new()
            }
        }
    }

    /// Decode persisted values. Persisted counters are only trusted when they
    /// match a recount of the entries.
    pub fn decode(entries_json: Option<&str>, stats_json: Option<&str>) -> Result<Self, DeskError> {
        let entries: Vec<HistoryEntry> = match entries_json {
            Some(json) => {
                serde_json::from_str(json).map_err(|e| DeskError::MalformedPersistedState {
                    key: HISTORY_KEY.to_string(),
                    reason: e.to_string(),
                })?
            }
            None => Vec::new(),
        };

        let recounted = AggregateStats::from_entries(&entries);
        let persisted = stats_json.and_then(|json| serde_json::from_str::<AggregateStats>(json).ok());
        if persisted.is_some_and(|stats| stats != recounted) {
            warn!(
                persisted = ?persisted,
                recounted = ?recounted,
                "Persisted stats disagree with history, using recount"
            );
        }

        Ok(Self {
            entries,
            stats: recounted,
        })
    }

    /// Record a scan at the head of the history and persist it.
    ///
    /// The entry is only kept once the write succeeds. On a storage error
    /// entries and counters are exactly as they were before the call.
    pub async fn append(
        &mut self,
        entry: HistoryEntry,
        store: &dyn KeyValueStore,
    ) -> Result<(), DeskError> {
        let mut stats = self.stats;
        stats.record(entry.is_threat);

        self.entries.insert(0, entry);
        if let Err(e) = write(store, &self.entries, &stats).await {
            self.entries.remove(0);
            return Err(e);
        }
        self.stats = stats;

        if let Some(entry) = self.entries.first() {
            info!(
                scan_target = %entry.target,
                kind = %entry.kind,
                is_threat = entry.is_threat,
                total = self.stats.total_scans,
                "Scan recorded"
            );
        }
        Ok(())
    }

    /// Write entries and counters together.
    pub async fn persist(&self, store: &dyn KeyValueStore) -> Result<(), DeskError> {
        write(store, &self.entries, &self.stats).await
    }

    /// Discard every entry and reset the counters. Nothing is discarded if
    /// the empty history cannot be written.
    pub async fn clear(&mut self, store: &dyn KeyValueStore) -> Result<(), DeskError> {
        write(store, &[], &AggregateStats::default()).await?;
        info!(discarded = self.entries.len(), "Scan history cleared");
        self.entries.clear();
        self.stats = AggregateStats::default();
        Ok(())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn stats(&self) -> AggregateStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn write(
    store: &dyn KeyValueStore,
    entries: &[HistoryEntry],
    stats: &AggregateStats,
) -> Result<(), DeskError> {
    let entries_json = serde_json::to_string(entries)
        .map_err(|e| DeskError::Storage(format!("Failed to encode scan history: {e}")))?;
    let stats_json = serde_json::to_string(stats)
        .map_err(|e| DeskError::Storage(format!("Failed to encode scan stats: {e}")))?;

    store
        .set_many(&[(HISTORY_KEY, entries_json.as_str()), (STATS_KEY, stats_json.as_str())])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(target: &str, is_threat: bool) -> HistoryEntry {
        HistoryEntry::new(
            target,
            TargetKind::Domain,
            ScanResult::default(),
            is_threat,
            Utc::now(),
        )
    }

    #[test]
    fn test_from_entries_counts() {
        let entries = vec![entry("a.com", true), entry("b.com", false), entry("c.com", false)];
        let stats = AggregateStats::from_entries(&entries);
        assert_eq!(stats.total_scans, 3);
        assert_eq!(stats.threats_detected, 1);
        assert_eq!(stats.clean_results, 2);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = HistoryStore::decode(Some("{not json"), None).unwrap_err();
        assert!(matches!(err, DeskError::MalformedPersistedState { .. }));
    }

    #[test]
    fn test_decode_recounts_inconsistent_stats() {
        let entries = serde_json::to_string(&vec![entry("a.com", true)]).unwrap();
        let stats = r#"{"total_scans": 40, "threats_detected": 1, "clean_results": 2}"#;
        let history = HistoryStore::decode(Some(&entries), Some(stats)).unwrap();
        assert_eq!(history.stats().total_scans, 1);
        assert_eq!(history.stats().threats_detected, 1);
    }

    #[test]
    fn test_decode_nothing_is_empty() {
        let history = HistoryStore::decode(None, None).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.stats(), AggregateStats::default());
    }
}
