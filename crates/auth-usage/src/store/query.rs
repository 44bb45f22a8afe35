//! Read-only lookups over the current snapshot.
//!
//! Every lookup is total: unknown or unnormalizable keys give an empty
//! bucket or an all-idle status bar, never an error.

use crate::client::UsageTransport;
use crate::clock::Clock;
use crate::histogram::{build_status_bar, idle_status_bar, HistogramFilter};
use crate::normalize::{normalize_id_key, normalize_index_key, strip_extension, RawKey};
use crate::types::{KeyStats, StatBucket, StatusBarData};

use super::AuthStatsStore;

impl<T: UsageTransport, C: Clock> AuthStatsStore<T, C> {
    /// Counters for one credential index.
    pub fn stats_by_index<'a>(&self, key: impl Into<RawKey<'a>>) -> StatBucket {
        let Some(key) = normalize_index_key(key) else {
            return StatBucket::default();
        };
        lookup(&self.snapshot().key_stats.by_auth_index, &key)
    }

    /// Counters for one credential identifier.
    pub fn stats_by_id<'a>(&self, key: impl Into<RawKey<'a>>) -> StatBucket {
        let Some(key) = normalize_id_key(key) else {
            return StatBucket::default();
        };
        lookup(&self.snapshot().key_stats.by_auth_id, &key)
    }

    /// Counters for one source name.
    ///
    /// Falls back to the name without its extension when the exact name was
    /// never logged, so `auth1.json` finds entries logged as `auth1`.
    pub fn stats_by_source(&self, name: &str) -> StatBucket {
        if name.is_empty() {
            return StatBucket::default();
        }
        let snapshot = self.snapshot();
        let by_source = &snapshot.key_stats.by_source;
        if let Some(bucket) = by_source.get(name) {
            return *bucket;
        }
        strip_extension(name)
            .filter(|stem| !stem.is_empty())
            .and_then(|stem| by_source.get(stem))
            .copied()
            .unwrap_or_default()
    }

    /// Status bar for one credential index.
    pub fn histogram_by_index<'a>(&self, key: impl Into<RawKey<'a>>) -> StatusBarData {
        self.histogram(HistogramFilter::by_index(key))
    }

    /// Status bar for one credential identifier.
    pub fn histogram_by_id<'a>(&self, key: impl Into<RawKey<'a>>) -> StatusBarData {
        self.histogram(HistogramFilter::by_id(key))
    }

    /// Status bar over every loaded detail.
    pub fn histogram_all(&self) -> StatusBarData {
        self.histogram(Some(HistogramFilter::all()))
    }

    /// Success percentage of a bucket; 100 when it is empty.
    pub fn success_rate(&self, bucket: &StatBucket) -> f64 {
        bucket.success_rate()
    }

    /// Whether any dimension holds data.
    pub fn has_data(&self) -> bool {
        self.snapshot().key_stats.has_data()
    }

    /// A copy of the current key stats.
    pub fn key_stats(&self) -> KeyStats {
        self.snapshot().key_stats.clone()
    }

    fn histogram(&self, filter: Option<HistogramFilter>) -> StatusBarData {
        let snapshot = self.snapshot();
        match filter {
            Some(filter) if !snapshot.details.is_empty() => {
                build_status_bar(&snapshot.details, &filter, self.clock.now())
            }
            _ => idle_status_bar(),
        }
    }
}

fn lookup(map: &std::collections::BTreeMap<String, StatBucket>, key: &str) -> StatBucket {
    map.get(key).copied().unwrap_or_default()
}
