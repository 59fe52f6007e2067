use chrono::{Duration, Utc};
use serre::config::HistoryConfig;
use serre::history::{HistoryEntry, HistoryStore};
use std::sync::Arc;

fn config(dir: &tempfile::TempDir, max_entries: usize) -> HistoryConfig {
    HistoryConfig {
        file: dir.path().join("history.json").display().to_string(),
        max_entries,
        ..Default::default()
    }
}

#[tokio::test]
async fn history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 10);

    let store = HistoryStore::open(&cfg).await.unwrap();
    store.record(&serre::Snapshot::new()).await.unwrap();
    store.record(&serre::Snapshot::new()).await.unwrap();
    drop(store);

    let reopened = HistoryStore::open(&cfg).await.unwrap();
    assert_eq!(reopened.len().await, 2);
}

#[tokio::test]
async fn reopen_truncates_to_capacity_keeping_newest() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();
    let entries: Vec<HistoryEntry> = (0..5)
        .map(|i| HistoryEntry {
            temperature: Some(f64::from(i)),
            average_humidity: None,
            timestamp: now - Duration::minutes(10 - i64::from(i)),
        })
        .rev()
        .collect();
    let cfg = config(&dir, 3);
    std::fs::write(&cfg.file, serde_json::to_vec(&entries).unwrap()).unwrap();

    let store = HistoryStore::open(&cfg).await.unwrap();
    let kept = store.since(now - Duration::hours(1)).await;
    let temps: Vec<_> = kept.iter().map(|e| e.temperature).collect();
    assert_eq!(temps, vec![Some(2.0), Some(3.0), Some(4.0)]);
}

#[tokio::test]
async fn since_filters_by_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 10);
    let old = HistoryEntry {
        temperature: Some(1.0),
        average_humidity: Some(10.0),
        timestamp: Utc::now() - Duration::hours(48),
    };
    std::fs::write(&cfg.file, serde_json::to_vec(&vec![old]).unwrap()).unwrap();

    let store = HistoryStore::open(&cfg).await.unwrap();
    store.record(&serre::Snapshot::new()).await.unwrap();

    assert_eq!(store.since(Utc::now() - Duration::hours(24)).await.len(), 1);
    assert_eq!(store.since(Utc::now() - Duration::hours(72)).await.len(), 2);
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 10);
    std::fs::write(&cfg.file, b"{not json").unwrap();
    assert!(HistoryStore::open(&cfg).await.is_err());
}

#[tokio::test]
async fn concurrent_records_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(HistoryStore::open(&config(&dir, 100)).await.unwrap());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.record(&serre::Snapshot::new()).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(store.len().await, 8);

    let on_disk: Vec<HistoryEntry> =
        serde_json::from_slice(&std::fs::read(dir.path().join("history.json")).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 8);
}
