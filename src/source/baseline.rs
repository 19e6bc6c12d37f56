//! Embedded baseline dataset.
//!
//! Shown in test mode and whenever the live source cannot be used, so the
//! dashboard is never empty. Build timestamps are rewritten on every load so
//! the data looks recent.

use crate::models::{ExternalJobRecord, FetchPayload, JobList};
use crate::tree::{NormalizeOptions, normalize_with};

const BASELINE_JSON: &str = include_str!("baseline.json");

const HOUR_MS: i64 = 3_600_000;

/// The raw baseline records, timestamps not yet refreshed.
pub fn baseline_records() -> Vec<ExternalJobRecord> {
    match serde_json::from_str(BASELINE_JSON) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "embedded baseline dataset is invalid");
            Vec::new()
        }
    }
}

/// Baseline records with timestamps placed relative to `now_ms`.
pub fn baseline_payload(now_ms: i64) -> FetchPayload {
    let mut records = baseline_records();
    refresh_timestamps(&mut records, now_ms);
    FetchPayload {
        jobs: Some(records),
        test_mode: true,
        error: None,
    }
}

/// The baseline dataset normalized with folders collapsed.
pub fn baseline_tree(now_ms: i64) -> JobList {
    let payload = baseline_payload(now_ms);
    let records = payload.jobs.unwrap_or_default();
    normalize_with(&records, &[], &NormalizeOptions::collapsed())
        .map(|report| report.jobs)
        .unwrap_or_default()
}

/// Rewrite every build timestamp to `now - offset`, where the offset is
/// between 1 and 24 hours and derived from the job name, so each job keeps
/// a stable position relative to the others.
pub fn refresh_timestamps(records: &mut [ExternalJobRecord], now_ms: i64) {
    for record in records.iter_mut() {
        if let (Some(name), Some(build)) = (record.name.as_deref(), record.last_build.as_mut()) {
            build.timestamp = Some(now_ms - name_offset_ms(name));
        }
        if let Some(children) = record.jobs.as_mut() {
            refresh_timestamps(children, now_ms);
        }
    }
}

/// `((sum of UTF-16 code units) % 24 + 1)` hours in milliseconds.
fn name_offset_ms(name: &str) -> i64 {
    let hash: i64 = name.encode_utf16().map(i64::from).sum();
    ((hash % 24) + 1) * HOUR_MS
}
