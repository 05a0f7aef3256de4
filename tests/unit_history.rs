// Unit tests for the history store.
//
// Covers the counter invariant across appends, recovery from corrupt or
// missing persisted state, and persistence through both store backends.

use chrono::{Duration, Utc};
use rusqlite::Connection;
use serde_json::json;

use threatdesk::backend::ScanResult;
use threatdesk::session::history::{HISTORY_KEY, STATS_KEY};
use threatdesk::session::{AggregateStats, HistoryEntry, HistoryStore};
use threatdesk::store::schema::create_tables;
use threatdesk::store::{KeyValueStore, MemoryStore, SqliteStore};
use threatdesk::target::TargetKind;

fn entry(target: &str, is_threat: bool) -> HistoryEntry {
    HistoryEntry::new(
        target,
        TargetKind::Domain,
        ScanResult::default().with_provider("virustotal", json!({"malicious": 0})),
        is_threat,
        Utc::now(),
    )
}

fn assert_invariant(history: &HistoryStore) {
    let stats = history.stats();
    assert_eq!(
        stats.total_scans,
        stats.threats_detected + stats.clean_results
    );
    assert_eq!(stats.total_scans as usize, history.len());
    assert_eq!(stats, AggregateStats::from_entries(history.entries()));
}

// ============================================================
// append: counters and ordering
// ============================================================

#[tokio::test]
async fn append_keeps_counters_consistent() {
    let store = MemoryStore::new();
    let mut history = HistoryStore::new();

    let verdicts = [false, true, false, false, true];
    for (i, is_threat) in verdicts.into_iter().enumerate() {
        history
            .append(entry(&format!("host{i}.com"), is_threat), &store)
            .await
            .unwrap();
        assert_invariant(&history);
    }

    assert_eq!(history.stats().threats_detected, 2);
    assert_eq!(history.stats().clean_results, 3);
}

#[tokio::test]
async fn append_puts_newest_first() {
    let store = MemoryStore::new();
    let mut history = HistoryStore::new();
    history.append(entry("old.com", false), &store).await.unwrap();
    history.append(entry("new.com", true), &store).await.unwrap();

    assert_eq!(history.latest().unwrap().target, "new.com");
    assert_eq!(history.get(1).unwrap().target, "old.com");
}

#[tokio::test]
async fn append_persists_entries_and_stats() {
    let store = MemoryStore::new();
    let mut history = HistoryStore::new();
    history.append(entry("example.com", false), &store).await.unwrap();

    let saved = store.snapshot().await;
    let entries: Vec<HistoryEntry> = serde_json::from_str(&saved[HISTORY_KEY]).unwrap();
    let stats: AggregateStats = serde_json::from_str(&saved[STATS_KEY]).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(stats.clean_results, 1);
}

// ============================================================
// load: recovery
// ============================================================

#[tokio::test]
async fn load_from_empty_store() {
    let history = HistoryStore::load(&MemoryStore::new()).await;
    assert!(history.is_empty());
    assert_eq!(history.stats(), AggregateStats::default());
}

#[tokio::test]
async fn load_corrupt_entries_starts_empty() {
    let store = MemoryStore::new()
        .with_value(HISTORY_KEY, "[{\"target\": ")
        .with_value(STATS_KEY, r#"{"total_scans": 3, "threats_detected": 1, "clean_results": 2}"#);
    let history = HistoryStore::load(&store).await;
    assert!(history.is_empty());
    assert_eq!(history.stats().total_scans, 0);
}

#[tokio::test]
async fn load_recomputes_disagreeing_stats() {
    let entries = vec![entry("a.com", true), entry("b.com", false)];
    let store = MemoryStore::new()
        .with_value(HISTORY_KEY, &serde_json::to_string(&entries).unwrap())
        .with_value(STATS_KEY, r#"{"total_scans": 99, "threats_detected": 0, "clean_results": 99}"#);

    let history = HistoryStore::load(&store).await;
    assert_eq!(history.len(), 2);
    assert_invariant(&history);
}

#[tokio::test]
async fn load_with_missing_stats_recounts() {
    let entries = vec![entry("a.com", true)];
    let store =
        MemoryStore::new().with_value(HISTORY_KEY, &serde_json::to_string(&entries).unwrap());
    let history = HistoryStore::load(&store).await;
    assert_eq!(history.stats().threats_detected, 1);
}

#[tokio::test]
async fn clear_resets_and_persists() {
    let store = MemoryStore::new();
    let mut history = HistoryStore::new();
    history.append(entry("a.com", true), &store).await.unwrap();
    history.clear(&store).await.unwrap();
    assert!(history.is_empty());
    assert_eq!(history.stats(), AggregateStats::default());

    let reloaded = HistoryStore::load(&store).await;
    assert!(reloaded.is_empty());
}

// ============================================================
// SQLite round trip
// ============================================================

fn sqlite_store() -> SqliteStore {
    let conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();
    SqliteStore::new(conn)
}

#[tokio::test]
async fn history_survives_sqlite_reload() {
    let store = sqlite_store();
    let mut history = HistoryStore::new();
    let mut older = entry("older.com", false);
    older.timestamp = Utc::now() - Duration::hours(2);
    history.append(older, &store).await.unwrap();
    history.append(entry("newer.com", true), &store).await.unwrap();

    let reloaded = HistoryStore::load(&store).await;
    assert_eq!(reloaded.entries(), history.entries());
    assert_eq!(reloaded.stats(), history.stats());
}

#[tokio::test]
async fn sqlite_set_many_writes_both_keys() {
    let store = sqlite_store();
    store
        .set_many(&[("a", "1"), ("b", "2")])
        .await
        .unwrap();
    assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn persist_copies_history_to_another_store() {
    let source = MemoryStore::new();
    let mut history = HistoryStore::new();
    history.append(entry("a.com", true), &source).await.unwrap();
    history.append(entry("b.com", false), &source).await.unwrap();

    let target = sqlite_store();
    history.persist(&target).await.unwrap();

    let reloaded = HistoryStore::load(&target).await;
    assert_eq!(reloaded.entries(), history.entries());
    assert_invariant(&reloaded);
}
