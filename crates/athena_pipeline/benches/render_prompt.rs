use athena_pipeline::types::{
    ActivityKind, Event, HeartRateSummary, MetricKind, MetricSample, Reminder, SleepEntry,
    Workout, WorkoutActivity,
};
use athena_pipeline::{Aggregator, ExportStore, FixedClock, PipelineConfig, PromptBuilder, Snapshot};
use chrono::{Duration, FixedOffset, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::Builder;

fn busy_snapshot() -> Snapshot {
    let now = FixedOffset::east_opt(10 * 3600)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 2, 8, 30, 0)
        .unwrap();
    let base = Utc.with_ymd_and_hms(2025, 4, 1, 20, 0, 0).unwrap();
    let mut snapshot = Snapshot::empty(now);

    snapshot.metrics = MetricKind::DAILY
        .iter()
        .enumerate()
        .map(|(i, k)| MetricSample::new(*k, 10.0 * i as f64 + 0.25))
        .collect();
    snapshot.sleep = (0..7)
        .map(|d| SleepEntry {
            date: now.date_naive() - Duration::days(d),
            duration_minutes: 420.0 + d as f64,
        })
        .collect();
    snapshot.workouts = (0..30)
        .map(|i| {
            let start = base + Duration::days(i);
            let end = start + Duration::minutes(45);
            Workout {
                id: format!("w{i}"),
                activity_kind: ActivityKind::Running,
                start,
                end,
                duration_seconds: 2700.0,
                device: Some("Watch".into()),
                metadata: BTreeMap::new(),
                activities: (0..3)
                    .map(|j| {
                        let s = start + Duration::minutes(15 * j);
                        WorkoutActivity {
                            calories: Some(150.0),
                            distance_meters: Some(2500.0),
                            pace_sec_per_km: Some(360.0),
                            heart_rate: Some(HeartRateSummary {
                                min: 120.0,
                                max: 170.0,
                                avg: 150.0,
                            }),
                            ..WorkoutActivity::bounds(s, s + Duration::minutes(15))
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    for h in 0..8 {
        snapshot.events.today.push(Event {
            id: format!("e{h}"),
            title: format!("Meeting {h}"),
            start: base + Duration::hours(h),
            end: base + Duration::hours(h) + Duration::minutes(30),
            is_all_day: false,
            location: Some("Room 4".into()),
            notes: None,
        });
        snapshot.reminders.tomorrow.push(Reminder {
            id: format!("r{h}"),
            title: format!("Task {h}"),
            due_date: Some(base + Duration::hours(h)),
            notes: None,
            priority: 1,
            is_completed: false,
        });
    }
    snapshot
}

fn bench_render(c: &mut Criterion) {
    let snapshot = busy_snapshot();
    let builder = PromptBuilder::default();
    c.bench_function("render_daily_prompt", |b| {
        b.iter(|| builder.render(std::hint::black_box(&snapshot)))
    });
}

fn bench_refresh(c: &mut Criterion) {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let now = FixedOffset::east_opt(10 * 3600)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 2, 8, 30, 0)
        .unwrap();
    let store = Arc::new(ExportStore::default());
    let aggregator = Aggregator::new(
        store.clone(),
        store,
        Arc::new(FixedClock(now)),
        PipelineConfig::default(),
    );

    c.bench_function("refresh_empty_export", |b| {
        b.to_async(&rt).iter(|| {
            let aggregator = aggregator.clone();
            async move {
                aggregator.refresh().await.expect("snapshot");
            }
        })
    });
}

criterion_group!(benches, bench_render, bench_refresh);
criterion_main!(benches);
