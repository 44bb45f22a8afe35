//! Cached usage snapshot with TTL-bounded refresh.
//!
//! [`AuthStatsStore`] owns one [`Snapshot`] of the usage document and its
//! derived aggregates. Only [`AuthStatsStore::refresh`] replaces it, and only
//! as a whole. Read queries (see the `query` submodule) take a cheap `Arc`
//! clone of whichever snapshot is current and never block on a fetch.
//!
//! # States
//!
//! ```text
//! empty ──refresh──▶ loading ──ok──▶ loaded
//!                       │              │
//!                       └──err──▶ error ◀┘ (data of the last good load kept)
//! ```
//!
//! At most one fetch runs at a time. A refresh that finds another one in
//! flight returns immediately; it neither queues nor cancels.

mod query;


use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::aggregate::compute_key_stats;
use crate::client::UsageTransport;
use crate::clock::{Clock, SystemClock};
use crate::collect::{collect_usage_details, unwrap_usage_envelope};
use crate::error::ApiError;
use crate::types::{KeyStats, UsageDetail};

/// Default time a loaded snapshot is served without refetching: 4 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(4 * 60);

/// Default upper bound on a single fetch: 30 seconds.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for [`AuthStatsStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// How long a loaded snapshot satisfies non-forced refreshes.
    pub ttl: Duration,
    /// Bound on one transport fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }
}

/// The raw usage document together with everything derived from it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Usage document after envelope unwrapping.
    pub usage: Value,
    /// Windowed per-dimension counters.
    pub key_stats: KeyStats,
    /// Every detail record with a timestamp, unwindowed.
    pub details: Vec<UsageDetail>,
}

impl Snapshot {
    /// Derive a snapshot from a fetched document.
    pub fn from_document(document: Value, now: DateTime<Utc>) -> Self {
        let usage = unwrap_usage_envelope(document);
        let key_stats = compute_key_stats(&usage, now);
        let details = collect_usage_details(&usage);
        Self {
            usage,
            key_stats,
            details,
        }
    }
}

/// UI-facing status flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    /// A fetch is in flight.
    pub loading: bool,
    /// At least one fetch has succeeded.
    pub loaded: bool,
    /// Message from the most recent failed fetch, cleared when a new one starts.
    pub error: Option<String>,
    /// Any key stats present in the current snapshot.
    pub has_data: bool,
    /// Start time of the most recent successful fetch.
    pub last_load_time: Option<DateTime<Utc>>,
}

/// What a call to [`AuthStatsStore::refresh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was already running; nothing was done.
    InFlight,
    /// The cached snapshot is still within its TTL; nothing was fetched.
    Fresh,
    /// A new snapshot was fetched and committed.
    Refreshed,
    /// The fetch failed; the previous snapshot is still in place.
    Failed(ApiError),
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Arc<Snapshot>,
    loading: bool,
    loaded: bool,
    stale: bool,
    error: Option<String>,
    last_load_time: Option<DateTime<Utc>>,
}

/// Usage statistics cache and query surface.
pub struct AuthStatsStore<T, C = SystemClock> {
    transport: T,
    clock: C,
    settings: StoreSettings,
    state: RwLock<StoreState>,
}

impl<T: UsageTransport> AuthStatsStore<T> {
    /// Creates an empty store on the system clock with default settings.
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, SystemClock, StoreSettings::default())
    }
}

impl<T: UsageTransport, C: Clock> AuthStatsStore<T, C> {
    /// Creates an empty store with an explicit clock and settings.
    pub fn with_settings(transport: T, clock: C, settings: StoreSettings) -> Self {
        Self {
            transport,
            clock,
            settings,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Fetch and rederive the snapshot unless a cached one is still fresh.
    ///
    /// With `force` the TTL is ignored, but a refresh already in flight still
    /// wins. On failure the error message is recorded and the previous
    /// snapshot is left untouched.
    pub async fn refresh(&self, force: bool) -> RefreshOutcome {
        let started = self.clock.now();
        {
            let mut state = self.write_state();
            if state.loading {
                debug!("usage refresh already in flight, skipping");
                return RefreshOutcome::InFlight;
            }
            if !force && state.loaded && !state.stale && self.within_ttl(&state, started) {
                debug!("usage snapshot still fresh, serving from cache");
                return RefreshOutcome::Fresh;
            }
            state.loading = true;
            state.error = None;
        }
        let _guard = LoadingGuard { store_state: &self.state };

        debug!(force, "fetching usage data");
        match self.fetch().await {
            Ok(document) => {
                let snapshot = Snapshot::from_document(document, self.clock.now());
                let details = snapshot.details.len();
                let mut state = self.write_state();
                state.snapshot = Arc::new(snapshot);
                state.loaded = true;
                state.stale = false;
                state.last_load_time = Some(started);
                info!(details, "usage snapshot refreshed");
                RefreshOutcome::Refreshed
            }
            Err(e) => {
                warn!(error = %e, "usage refresh failed, keeping previous snapshot");
                self.write_state().error = Some(e.to_string());
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Mark the snapshot stale so the next non-forced refresh fetches.
    ///
    /// The data itself stays available until that fetch succeeds.
    pub fn invalidate(&self) {
        self.write_state().stale = true;
    }

    /// Current status flags.
    pub fn status(&self) -> CacheStatus {
        let state = self.read_state();
        CacheStatus {
            loading: state.loading,
            loaded: state.loaded,
            error: state.error.clone(),
            has_data: state.snapshot.key_stats.has_data(),
            last_load_time: state.last_load_time,
        }
    }

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.read_state().snapshot)
    }

    async fn fetch(&self) -> Result<Value, ApiError> {
        match self.settings.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.fetch_usage())
                .await
                .unwrap_or(Err(ApiError::Timeout(limit))),
            None => self.transport.fetch_usage().await,
        }
    }

    fn within_ttl(&self, state: &StoreState, now: DateTime<Utc>) -> bool {
        let Some(last) = state.last_load_time else {
            return false;
        };
        match TimeDelta::from_std(self.settings.ttl) {
            Ok(ttl) => now - last < ttl,
            // beyond chrono's range: never expires
            Err(_) => true,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears `loading` when a refresh ends, including when its future is dropped.
struct LoadingGuard<'a> {
    store_state: &'a RwLock<StoreState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store_state.write().unwrap_or_else(|e| e.into_inner());
        state.loading = false;
    }
}
