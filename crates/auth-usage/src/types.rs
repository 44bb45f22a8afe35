//! Type definitions for usage telemetry and its derived aggregates.
//!
//! Raw usage documents are loosely typed JSON; everything in this module is
//! the typed form produced after collection and normalization.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged request, flattened out of the `apis → models → details` tree.
///
/// Key fields are already normalized; see [`crate::normalize`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageDetail {
    /// Occurrence time as logged upstream. Not guaranteed to parse.
    pub timestamp: String,

    /// Originating file or channel name.
    #[serde(default)]
    pub source: Option<String>,

    /// Canonical credential identifier.
    #[serde(default)]
    pub credential_id: Option<String>,

    /// Canonical credential index.
    #[serde(default)]
    pub credential_index: Option<String>,

    /// Whether the request failed. Absent means success.
    #[serde(default)]
    pub failed: bool,
}

impl UsageDetail {
    /// Parse [`timestamp`](Self::timestamp) into a UTC instant.
    ///
    /// Returns `None` when the value is not a recognizable timestamp.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Offset-carrying forms tried after RFC 3339. A trailing `Z` is rewritten
/// to `+00:00` first.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

/// Forms without an offset, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp.
///
/// RFC 3339 values are converted to UTC. Seconds may be omitted, the offset
/// may be written without a colon, and a bare `YYYY-MM-DD` is midnight UTC.
/// Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let zoned = match raw.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&zoned, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Success/failure counters for one dimension key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatBucket {
    /// Requests that completed without `failed: true`.
    pub success: u64,
    /// Requests flagged `failed: true`.
    pub failure: u64,
}

impl StatBucket {
    /// Record one request outcome.
    pub fn record(&mut self, failed: bool) {
        if failed {
            self.failure += 1;
        } else {
            self.success += 1;
        }
    }

    /// Total number of recorded requests.
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Success percentage in `[0, 100]`; exactly 100 when empty.
    pub fn success_rate(&self) -> f64 {
        success_rate(self.success, self.failure)
    }
}

/// `100 × success / (success + failure)`, or 100 when both are zero.
pub(crate) fn success_rate(success: u64, failure: u64) -> f64 {
    let total = success + failure;
    if total == 0 {
        100.0
    } else {
        success as f64 / total as f64 * 100.0
    }
}

/// Per-dimension counters derived from one usage document.
///
/// Keys only exist once observed; lookups of unknown keys are treated as an
/// empty bucket by the query layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyStats {
    /// Counters keyed by request source.
    pub by_source: BTreeMap<String, StatBucket>,
    /// Counters keyed by canonical credential index.
    pub by_auth_index: BTreeMap<String, StatBucket>,
    /// Counters keyed by canonical credential identifier.
    pub by_auth_id: BTreeMap<String, StatBucket>,
}

impl KeyStats {
    /// Returns `true` if any of the three mappings holds a key.
    pub fn has_data(&self) -> bool {
        !(self.by_source.is_empty() && self.by_auth_index.is_empty() && self.by_auth_id.is_empty())
    }
}

/// Classification of one histogram slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatusBlockState {
    /// No requests in the slot.
    Idle,
    /// Failure rate below 20%.
    Success,
    /// Failure rate between 20% and 50% inclusive.
    Mixed,
    /// Failure rate above 50%.
    Failure,
}

/// Fixed-width activity histogram over the trailing window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusBarData {
    /// Slot classifications, oldest first.
    pub blocks: Vec<StatusBlockState>,
    /// Raw per-slot counters backing `blocks`, oldest first.
    pub slots: Vec<StatBucket>,
    /// Window-wide success percentage in `[0, 100]`.
    pub success_rate: f64,
    /// Successful requests in the window.
    pub total_success: u64,
    /// Failed requests in the window.
    pub total_failure: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_rfc3339_with_offset_converts_to_utc() {
        let ts = parse_timestamp("2026-01-22T09:00:00+02:00").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 1, 22, 7, 0, 0).unwrap());
    }

    #[test]
    fn parse_fractional_seconds() {
        let ts = parse_timestamp("2026-01-22T09:00:00.123456789Z").expect("should parse");
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn parse_naive_is_utc() {
        let ts = parse_timestamp("2026-01-22T09:00:00").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 1, 22, 9, 0, 0).unwrap());
        let spaced = parse_timestamp("2026-01-22 09:00:00").expect("should parse");
        assert_eq!(spaced, ts);
    }

    #[test]
    fn parse_minutes_precision_with_zulu() {
        let ts = parse_timestamp("2026-03-01T11:50Z").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 11, 50, 0).unwrap());
    }

    #[test]
    fn parse_minutes_precision_with_offset() {
        let ts = parse_timestamp("2026-03-01T13:50+02:00").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 11, 50, 0).unwrap());
    }

    #[test]
    fn parse_naive_minutes_is_utc() {
        let ts = parse_timestamp("2026-03-01T11:50").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 11, 50, 0).unwrap());
    }

    #[test]
    fn parse_offset_without_colon() {
        let ts = parse_timestamp("2026-03-01T11:50:00.000+0000").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 11, 50, 0).unwrap());
        let shifted = parse_timestamp("2026-03-01T12:50:00-0100").expect("should parse");
        assert_eq!(shifted, Utc.with_ymd_and_hms(2026, 3, 1, 13, 50, 0).unwrap());
    }

    #[test]
    fn parse_date_only_is_utc_midnight() {
        let ts = parse_timestamp("2026-03-01").expect("should parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_garbage_is_none() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("2026-13-01").is_none());
        assert!(parse_timestamp("2026-03-01T11Z").is_none());
    }

    #[test]
    fn bucket_records_and_rates() {
        let mut bucket = StatBucket::default();
        assert!(bucket.is_empty());
        assert_eq!(bucket.success_rate(), 100.0);

        bucket.record(false);
        bucket.record(true);
        bucket.record(true);
        bucket.record(false);
        assert_eq!(bucket, StatBucket { success: 2, failure: 2 });
        assert_eq!(bucket.total(), 4);
        assert!((bucket.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_all_failures_is_zero() {
        let bucket = StatBucket { success: 0, failure: 3 };
        assert_eq!(bucket.success_rate(), 0.0);
    }

    #[test]
    fn key_stats_has_data_checks_every_dimension() {
        let mut stats = KeyStats::default();
        assert!(!stats.has_data());
        stats.by_auth_id.insert("abc".to_string(), StatBucket::default());
        assert!(stats.has_data());
    }

    #[test]
    fn block_state_serializes_lowercase() {
        let json = serde_json::to_string(&vec![
            StatusBlockState::Idle,
            StatusBlockState::Success,
            StatusBlockState::Mixed,
            StatusBlockState::Failure,
        ])
        .expect("serialize");
        assert_eq!(json, r#"["idle","success","mixed","failure"]"#);
    }

    #[test]
    fn usage_detail_defaults_when_fields_missing() {
        let detail: UsageDetail =
            serde_json::from_str(r#"{"timestamp":"2026-01-22T09:00:00Z"}"#).expect("parse");
        assert_eq!(detail.source, None);
        assert!(!detail.failed);
        assert!(detail.parsed_timestamp().is_some());
    }
}
