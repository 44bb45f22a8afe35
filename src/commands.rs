//! Implementation of the `stats` and `status-bar` subcommands.
//!
//! Both load one snapshot through an [`AuthStatsStore`] and render a
//! serializable report; printing is left to `main`.

use std::path::Path;

use auth_usage::{
    ApiError, AuthStatsStore, KeyStats, RefreshOutcome, StatBucket, StatusBarData, SystemClock,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::schema::Config;
use crate::transport::{SourceError, UsageSource};

/// Errors surfaced by the subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The transport could not be set up.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Nothing could be loaded at all.
    #[error("Usage data unavailable: {0}")]
    Unavailable(ApiError),
}

/// Store type used by the binary.
pub type Store = AuthStatsStore<UsageSource, SystemClock>;

/// Build a store from `config` and load it once.
///
/// Fails only when the fetch fails and no snapshot is available.
pub async fn load_store(config: &Config, file: Option<&Path>) -> Result<Store, CliError> {
    let source = UsageSource::from_config(config, file)?;
    let settings = config.store_settings().map_err(SourceError::from)?;
    let store = AuthStatsStore::with_settings(source, SystemClock, settings);

    if let RefreshOutcome::Failed(e) = store.refresh(false).await {
        if !store.status().loaded {
            return Err(CliError::Unavailable(e));
        }
    }
    Ok(store)
}

/// Which counters `aud stats` should report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    /// Credential index.
    pub index: Option<String>,
    /// Credential identifier.
    pub id: Option<String>,
    /// Source file name.
    pub source: Option<String>,
}

impl StatsQuery {
    fn is_empty(&self) -> bool {
        self.index.is_none() && self.id.is_none() && self.source.is_none()
    }
}

/// Counters for one looked-up key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketReport {
    /// The key as given on the command line.
    pub key: String,
    /// Successful requests.
    pub success: u64,
    /// Failed requests.
    pub failure: u64,
    /// Success percentage, 100 when there were no requests.
    pub success_rate: f64,
}

impl BucketReport {
    fn new(key: &str, bucket: StatBucket) -> Self {
        Self {
            key: key.to_string(),
            success: bucket.success,
            failure: bucket.failure,
            success_rate: bucket.success_rate(),
        }
    }
}

/// Output of `aud stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    /// Whether any counters were loaded.
    pub has_data: bool,
    /// When the data was fetched.
    pub last_load_time: Option<DateTime<Utc>>,
    /// Counters for `--index`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<BucketReport>,
    /// Counters for `--id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<BucketReport>,
    /// Counters for `--source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<BucketReport>,
    /// Every dimension, when no key was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_stats: Option<KeyStats>,
}

/// Answer a stats query from a loaded store.
pub fn stats_report(store: &Store, query: &StatsQuery) -> StatsReport {
    let status = store.status();
    StatsReport {
        has_data: status.has_data,
        last_load_time: status.last_load_time,
        index: query
            .index
            .as_deref()
            .map(|k| BucketReport::new(k, store.stats_by_index(k))),
        id: query
            .id
            .as_deref()
            .map(|k| BucketReport::new(k, store.stats_by_id(k))),
        source: query
            .source
            .as_deref()
            .map(|k| BucketReport::new(k, store.stats_by_source(k))),
        key_stats: query.is_empty().then(|| store.key_stats()),
    }
}

/// Which credential `aud status-bar` should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarSelector {
    /// All credentials.
    All,
    /// One credential index.
    Index(String),
    /// One credential identifier.
    Id(String),
}

/// Build the status bar for `selector`.
pub fn status_bar_report(store: &Store, selector: &BarSelector) -> StatusBarData {
    match selector {
        BarSelector::All => store.histogram_all(),
        BarSelector::Index(key) => store.histogram_by_index(key.as_str()),
        BarSelector::Id(key) => store.histogram_by_id(key.as_str()),
    }
}

/// Render a status bar as one glyph per slot, oldest first.
pub fn render_blocks(bar: &StatusBarData) -> String {
    use auth_usage::StatusBlockState::*;
    bar.blocks
        .iter()
        .map(|state| match state {
            Idle => '·',
            Success => '▇',
            Mixed => '▅',
            Failure => '▁',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_usage::{StatusBlockState, STATUS_BLOCK_COUNT};
    use chrono::TimeDelta;
    use serde_json::json;
    use std::fs;

    fn write_usage(dir: &Path) -> std::path::PathBuf {
        let now = Utc::now();
        let at = |minutes: i64| (now - TimeDelta::minutes(minutes)).to_rfc3339();
        let doc = json!({ "usage": { "apis": { "openai": { "models": { "gpt": { "details": [
            { "timestamp": at(50), "auth_index": 1, "auth_id": "cred-a", "source": "auth1", "failed": true },
            { "timestamp": at(20), "auth_index": 1, "auth_id": "cred-a", "source": "auth1", "failed": false },
            { "timestamp": at(5), "auth_index": 1, "auth_id": "cred-a", "source": "auth1", "failed": true },
            { "timestamp": at(5), "auth_index": 2, "auth_id": "cred-b", "source": "auth2" }
        ]}}}}}});
        let path = dir.join("usage.json");
        fs::write(&path, doc.to_string()).expect("write usage");
        path
    }

    #[tokio::test]
    async fn stats_for_index_id_and_source() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = write_usage(dir.path());
        let store = load_store(&Config::default(), Some(&file))
            .await
            .expect("store loads");

        let query = StatsQuery {
            index: Some("1".to_string()),
            id: Some("cred-b".to_string()),
            source: Some("auth1.json".to_string()),
        };
        let report = stats_report(&store, &query);
        assert!(report.has_data);
        assert!(report.last_load_time.is_some());
        assert!(report.key_stats.is_none());

        let index = report.index.expect("index report");
        assert_eq!((index.success, index.failure), (1, 2));
        let id = report.id.expect("id report");
        assert_eq!((id.success, id.failure), (1, 0));
        assert_eq!(id.success_rate, 100.0);
        let source = report.source.expect("source report");
        assert_eq!(source.key, "auth1.json");
        assert_eq!(source.failure, 2);
    }

    #[tokio::test]
    async fn stats_without_keys_returns_everything() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = write_usage(dir.path());
        let store = load_store(&Config::default(), Some(&file))
            .await
            .expect("store loads");

        let report = stats_report(&store, &StatsQuery::default());
        let key_stats = report.key_stats.expect("full stats");
        assert_eq!(key_stats.by_auth_index.len(), 2);
        assert_eq!(key_stats.by_auth_id.len(), 2);
        assert_eq!(key_stats.by_source.len(), 2);

        let rendered = serde_json::to_value(&StatsReport {
            key_stats: None,
            ..report
        })
        .expect("serialize");
        assert!(rendered.get("index").is_none());
    }

    #[tokio::test]
    async fn status_bar_for_selectors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = write_usage(dir.path());
        let store = load_store(&Config::default(), Some(&file))
            .await
            .expect("store loads");

        let all = status_bar_report(&store, &BarSelector::All);
        assert_eq!(all.total_success + all.total_failure, 4);

        let one = status_bar_report(&store, &BarSelector::Index("1".to_string()));
        assert_eq!(one.blocks.len(), STATUS_BLOCK_COUNT);
        assert_eq!((one.total_success, one.total_failure), (1, 2));

        let unknown = status_bar_report(&store, &BarSelector::Id("nobody".to_string()));
        assert!(unknown.blocks.iter().all(|b| *b == StatusBlockState::Idle));
        assert_eq!(unknown.success_rate, 100.0);
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        match load_store(&Config::default(), Some(&dir.path().join("gone.json"))).await {
            Err(CliError::Unavailable(ApiError::Network(_))) => {}
            Err(other) => panic!("expected Unavailable(Network), got: {other:?}"),
            Ok(_) => panic!("load should fail without data"),
        }
    }

    #[test]
    fn render_blocks_one_glyph_per_slot() {
        let bar = auth_usage::histogram::idle_status_bar();
        let rendered = render_blocks(&bar);
        assert_eq!(rendered.chars().count(), STATUS_BLOCK_COUNT);
        assert!(rendered.chars().all(|c| c == '·'));
    }
}
