//! Workout history and per-interval statistics.

use futures_util::future::join_all;

use super::PendingQueries;
use crate::store::{HealthStore, SampleType, SortOrder, WorkoutRecord};
use crate::types::{
    Aggregation, HeartRateSummary, MetricKind, Workout, WorkoutActivity, pace_sec_per_km,
};

fn from_record(record: WorkoutRecord) -> Workout {
    let mut activities: Vec<WorkoutActivity> = record
        .intervals
        .iter()
        .filter(|b| b.end > b.start)
        .map(|b| WorkoutActivity::bounds(b.start, b.end))
        .collect();
    if activities.is_empty() {
        activities.push(WorkoutActivity::bounds(record.start, record.end));
    }
    activities.sort_by_key(|a| a.start);

    Workout {
        duration_seconds: (record.end - record.start).num_milliseconds().max(0) as f64 / 1000.0,
        id: record.id,
        activity_kind: record.activity_kind,
        start: record.start,
        end: record.end,
        device: record.device,
        metadata: record.metadata,
        activities,
    }
}

/// Every workout the store knows about, ascending by start. Interval bounds
/// are filled in; their statistics are left unset.
pub async fn list_workouts(store: &dyn HealthStore, pending: &PendingQueries) -> Vec<Workout> {
    pending.dispatch(1);
    let records = match pending.track(store.workouts()).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "workout query failed");
            return Vec::new();
        }
    };

    let mut workouts: Vec<Workout> = records.into_iter().map(from_record).collect();
    workouts.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    tracing::debug!(count = workouts.len(), "listed workouts");
    workouts
}

async fn resolve_interval(
    store: &dyn HealthStore,
    distance_kind: MetricKind,
    interval: &WorkoutActivity,
    pending: &PendingQueries,
) -> WorkoutActivity {
    let window = interval.window();
    pending.dispatch(3);

    let calories = pending.track(store.statistics(
        MetricKind::ActiveEnergy,
        window,
        Aggregation::CumulativeSum,
    ));
    let distance =
        pending.track(store.statistics(distance_kind, window, Aggregation::CumulativeSum));
    let heart_rate = pending.track(store.samples(
        SampleType::Quantity(MetricKind::HeartRate),
        window,
        SortOrder::Ascending,
        None,
    ));
    let (calories, distance, heart_rate) = tokio::join!(calories, distance, heart_rate);

    let calories = calories
        .inspect_err(|e| tracing::warn!(error = %e, "interval calories query failed"))
        .ok()
        .flatten();
    let distance_meters = distance
        .inspect_err(|e| tracing::warn!(error = %e, "interval distance query failed"))
        .ok()
        .flatten();
    let readings: Vec<f64> = match heart_rate {
        Ok(samples) => samples
            .iter()
            .filter(|s| window.contains(s.start))
            .map(|s| s.value)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "interval heart rate query failed");
            Vec::new()
        }
    };

    WorkoutActivity {
        start: interval.start,
        end: interval.end,
        calories,
        distance_meters,
        pace_sec_per_km: pace_sec_per_km(interval.duration_seconds(), distance_meters),
        heart_rate: HeartRateSummary::from_readings(&readings),
    }
}

/// Resolve calories, distance, pace and heart rate for every interval of
/// `workout`. Intervals are resolved concurrently.
pub async fn activity_metrics(
    store: &dyn HealthStore,
    workout: &Workout,
    pending: &PendingQueries,
) -> Vec<WorkoutActivity> {
    let distance_kind = workout.activity_kind.distance_kind();
    let intervals = if workout.activities.is_empty() {
        vec![WorkoutActivity::bounds(workout.start, workout.end)]
    } else {
        workout.activities.clone()
    };

    join_all(
        intervals
            .iter()
            .map(|interval| resolve_interval(store, distance_kind, interval, pending)),
    )
    .await
}
