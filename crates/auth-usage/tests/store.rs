//! Drives the store through its public API from multiple tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use auth_usage::{
    ApiError, AuthStatsStore, ManualClock, RefreshOutcome, StatBucket, StatusBlockState,
    StoreSettings, UsageTransport, STATUS_BLOCK_COUNT,
};
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::{json, Value};

/// Slow transport returning the same document each time.
struct SlowTransport {
    document: Value,
    delay: Duration,
    calls: AtomicUsize,
}

impl UsageTransport for SlowTransport {
    async fn fetch_usage(&self) -> Result<Value, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.document.clone())
    }
}

fn document(now: chrono::DateTime<Utc>) -> Value {
    let at = |minutes: i64| (now - TimeDelta::minutes(minutes)).to_rfc3339();
    json!({ "usage": { "apis": { "p": { "models": { "m": { "details": [
        { "timestamp": at(10), "auth_index": 7, "auth_id": "k7", "source": "k7.json" },
        { "timestamp": at(10), "auth_index": 7, "auth_id": "k7", "source": "k7.json", "failed": true },
        { "timestamp": at(400), "auth_index": 8, "auth_id": "k8", "source": "k8.json" }
    ]}}}}}})
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_refreshes_share_one_fetch() {
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap();
    let transport = SlowTransport {
        document: document(now),
        delay: Duration::from_millis(100),
        calls: AtomicUsize::new(0),
    };
    let store = Arc::new(AuthStatsStore::with_settings(
        transport,
        ManualClock::new(now),
        StoreSettings::default(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.refresh(false).await })
        })
        .collect();

    let mut refreshed = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            RefreshOutcome::Refreshed => refreshed += 1,
            RefreshOutcome::InFlight | RefreshOutcome::Fresh => {}
            RefreshOutcome::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }
    assert_eq!(refreshed, 1);

    let status = store.status();
    assert!(status.loaded);
    assert!(!status.loading);

    assert_eq!(store.stats_by_index(7_u32), StatBucket { success: 1, failure: 1 });
    assert_eq!(store.stats_by_source("k8.json"), StatBucket { success: 1, failure: 0 });

    let bar = store.histogram_by_id("k7");
    assert_eq!(bar.blocks.len(), STATUS_BLOCK_COUNT);
    assert_eq!(bar.blocks[STATUS_BLOCK_COUNT - 1], StatusBlockState::Mixed);
    assert_eq!(bar.success_rate, 50.0);
}

#[tokio::test]
async fn snapshot_serializes_for_presentation() {
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap();
    let store = AuthStatsStore::with_settings(
        SlowTransport {
            document: document(now),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        },
        ManualClock::new(now),
        StoreSettings::default(),
    );
    store.refresh(false).await;

    let value = serde_json::to_value(store.key_stats()).expect("serialize");
    assert_eq!(value["by_auth_id"]["k7"]["failure"], 1);

    let bar = serde_json::to_value(store.histogram_all()).expect("serialize");
    assert_eq!(bar["blocks"][STATUS_BLOCK_COUNT - 1], "mixed");
    assert_eq!(bar["blocks"][0], "idle");
}
