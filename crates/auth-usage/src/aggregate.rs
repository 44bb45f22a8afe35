//! Per-dimension success/failure counters over the trailing window.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use crate::collect::raw_details;
use crate::histogram::STATUS_WINDOW_MS;
use crate::types::{KeyStats, StatBucket, UsageDetail};

/// Compute [`KeyStats`] straight from a raw usage document.
///
/// Walks the raw tree itself rather than a pre-collected detail list, so it
/// can be checked against raw input alone. Records whose timestamp does not
/// parse, or falls outside `[now - 24h, now]`, are skipped. Each remaining
/// record bumps every dimension it carries a key for: source, credential
/// index, credential identifier. The result is rebuilt from scratch on every
/// call.
pub fn compute_key_stats(usage: &Value, now: DateTime<Utc>) -> KeyStats {
    let window_start = now - TimeDelta::milliseconds(STATUS_WINDOW_MS);
    let mut stats = KeyStats::default();

    for detail in raw_details(usage).filter_map(UsageDetail::from_raw) {
        let Some(ts) = detail.parsed_timestamp() else {
            continue;
        };
        if ts < window_start || ts > now {
            continue;
        }

        if let Some(source) = detail.source {
            bump(&mut stats.by_source, source, detail.failed);
        }
        if let Some(index) = detail.credential_index {
            bump(&mut stats.by_auth_index, index, detail.failed);
        }
        if let Some(id) = detail.credential_id {
            bump(&mut stats.by_auth_id, id, detail.failed);
        }
    }

    stats
}

fn bump(map: &mut std::collections::BTreeMap<String, StatBucket>, key: String, failed: bool) {
    map.entry(key).or_default().record(failed);
}
