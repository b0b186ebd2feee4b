//! Health metric, sleep and mindfulness queries.

use chrono::{DateTime, FixedOffset};
use futures_util::future::join_all;
use std::collections::BTreeMap;

use super::PendingQueries;
use crate::store::{HealthStore, SampleType, SortOrder};
use crate::types::{MetricKind, MetricSample, MindfulSession, SleepEntry, TimeWindow};
use crate::utils::{local_day, trailing_days};

/// Kinds in first-seen order with duplicates removed.
fn distinct(kinds: &[MetricKind]) -> Vec<MetricKind> {
    let mut out: Vec<MetricKind> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !out.contains(kind) {
            out.push(*kind);
        }
    }
    out
}

/// One statistics query per distinct kind, all in flight at once. The result
/// holds at most one sample per kind, in the order the kinds were given.
pub async fn fetch_metrics(
    store: &dyn HealthStore,
    kinds: &[MetricKind],
    window: TimeWindow,
    pending: &PendingQueries,
) -> Vec<MetricSample> {
    let kinds = distinct(kinds);
    pending.dispatch(kinds.len());

    let queries = kinds.iter().map(|&kind| {
        pending.track(async move {
            match store.statistics(kind, window, kind.aggregation()).await {
                Ok(Some(value)) => Some(MetricSample::new(kind, value)),
                Ok(None) if kind.zero_when_empty() => Some(MetricSample::new(kind, 0.0)),
                Ok(None) => {
                    tracing::debug!(kind = kind.name(), "no samples in window");
                    None
                }
                Err(e) => {
                    tracing::warn!(kind = kind.name(), error = %e, "metric query failed");
                    None
                }
            }
        })
    });

    join_all(queries).await.into_iter().flatten().collect()
}

/// Total sleep per local day over the trailing `days`, ascending by date.
/// Each sample counts toward the day on which it ends.
pub async fn fetch_sleep(
    store: &dyn HealthStore,
    now: &DateTime<FixedOffset>,
    days: u32,
    pending: &PendingQueries,
) -> Vec<SleepEntry> {
    let window = trailing_days(now, days);
    pending.dispatch(1);
    let samples = pending
        .track(store.samples(SampleType::SleepAnalysis, window, SortOrder::Ascending, None))
        .await;
    let samples = match samples {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "sleep query failed");
            return Vec::new();
        }
    };

    let first_day = local_day(window.start, now);
    let today = now.date_naive();
    let mut per_day: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for sample in samples {
        let minutes = (sample.end - sample.start).num_seconds() as f64 / 60.0;
        if minutes <= 0.0 {
            continue;
        }
        let day = local_day(sample.end, now);
        if day < first_day || day > today {
            continue;
        }
        *per_day.entry(day).or_insert(0.0) += minutes;
    }

    per_day
        .into_iter()
        .map(|(date, duration_minutes)| SleepEntry {
            date,
            duration_minutes,
        })
        .collect()
}

/// The most recent mindful session within the trailing `days`.
pub async fn latest_mindful_session(
    store: &dyn HealthStore,
    now: &DateTime<FixedOffset>,
    days: u32,
    pending: &PendingQueries,
) -> Option<MindfulSession> {
    let window = trailing_days(now, days);
    pending.dispatch(1);
    let result = pending
        .track(store.samples(
            SampleType::MindfulSession,
            window,
            SortOrder::Descending,
            Some(1),
        ))
        .await;
    match result {
        Ok(samples) => samples
            .into_iter()
            .max_by_key(|s| s.end)
            .map(|s| MindfulSession {
                start: s.start,
                end: s.end,
                duration_minutes: (s.end - s.start).num_seconds() as f64 / 60.0,
            }),
        Err(e) => {
            tracing::warn!(error = %e, "mindful session query failed");
            None
        }
    }
}
