//! Joins the source adapters into one immutable [`Snapshot`] per fetch cycle.
//!
//! Cycle bookkeeping sits behind a mutex; the published state lives in a
//! `watch` channel and is only ever replaced, so a reader always sees either
//! no snapshot or a complete one. When cycles overlap the most recently
//! requested one wins: an older cycle that finishes late is discarded.

use chrono::{DateTime, FixedOffset};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::sources::{PendingQueries, calendar, metrics as health, workouts};
use crate::store::{CalendarStore, EntityKind, HealthStore, SampleType};
use crate::types::{DayBuckets, Event, Reminder, Snapshot, Workout};
use crate::utils::{Clock, today_so_far, yesterday_through_tomorrow};

pub const FETCH_CYCLES_TOTAL: &str = "athena_fetch_cycles_total";

#[derive(Clone, Debug, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    FetchInProgress {
        cycle: u64,
        pending: PendingQueries,
    },
    Ready {
        cycle: u64,
    },
}

#[derive(Clone, Debug, Default)]
pub struct AggregatorState {
    pub phase: FetchPhase,
    /// Last published snapshot; kept while a newer cycle is in flight.
    pub snapshot: Option<Arc<Snapshot>>,
    pub published_cycle: u64,
    pub publications: u64,
}

#[derive(Default)]
struct CycleBook {
    next: u64,
    latest_requested: u64,
}

struct Inner {
    health: Arc<dyn HealthStore>,
    calendar: Arc<dyn CalendarStore>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
    book: Mutex<CycleBook>,
    state: watch::Sender<AggregatorState>,
}

#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl Aggregator {
    pub fn new(
        health: Arc<dyn HealthStore>,
        calendar: Arc<dyn CalendarStore>,
        clock: Arc<dyn Clock>,
        config: PipelineConfig,
    ) -> Self {
        let (state, _rx) = watch::channel(AggregatorState::default());
        Self {
            inner: Arc::new(Inner {
                health,
                calendar,
                clock,
                config,
                book: Mutex::new(CycleBook::default()),
                state,
            }),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn current(&self) -> AggregatorState {
        self.inner.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.state.borrow().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregatorState> {
        self.inner.state.subscribe()
    }

    /// Queries of the in-flight cycle that have not resolved yet.
    pub fn pending(&self) -> usize {
        match &self.inner.state.borrow().phase {
            FetchPhase::FetchInProgress { pending, .. } => pending.remaining(),
            _ => 0,
        }
    }

    /// Run a fetch cycle and return the newest published snapshot.
    ///
    /// The cycle runs on its own task, so dropping this future does not leave
    /// a half-finished cycle behind. If a newer refresh starts before this one
    /// completes, the result of the newer cycle is returned instead.
    pub async fn refresh(&self) -> PipelineResult<Arc<Snapshot>> {
        let cycle = {
            let mut book = self.inner.book.lock().await;
            book.next += 1;
            book.latest_requested = book.next;
            book.next
        };
        let pending = PendingQueries::new();
        self.inner.state.send_modify(|s| {
            s.phase = FetchPhase::FetchInProgress {
                cycle,
                pending: pending.clone(),
            };
        });
        tracing::debug!(cycle, "fetch cycle started");

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let now = inner.clock.now();
            let snapshot = collect(&inner, now, &pending).await;
            publish(&inner, cycle, snapshot).await;
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))?;

        let mut rx = self.inner.state.subscribe();
        let state = rx
            .wait_for(|s| s.published_cycle >= cycle && s.snapshot.is_some())
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?;
        state
            .snapshot
            .clone()
            .ok_or_else(|| PipelineError::Task("no snapshot published".into()))
    }
}

async fn publish(inner: &Inner, cycle: u64, snapshot: Snapshot) {
    let book = inner.book.lock().await;
    if cycle != book.latest_requested {
        tracing::info!(
            cycle,
            latest = book.latest_requested,
            "discarding superseded fetch cycle"
        );
        metrics::counter!(FETCH_CYCLES_TOTAL, "outcome" => "superseded").increment(1);
        return;
    }

    let snapshot = Arc::new(snapshot);
    inner.state.send_modify(|s| {
        s.phase = FetchPhase::Ready { cycle };
        s.snapshot = Some(snapshot.clone());
        s.published_cycle = cycle;
        s.publications += 1;
    });
    metrics::counter!(FETCH_CYCLES_TOTAL, "outcome" => "published").increment(1);
    tracing::info!(
        cycle,
        metrics = snapshot.metrics.len(),
        workouts = snapshot.workouts.len(),
        events = snapshot.events.len(),
        reminders = snapshot.reminders.len(),
        "snapshot published"
    );
}

fn health_types(config: &PipelineConfig) -> Vec<SampleType> {
    let mut types: Vec<SampleType> = config
        .metric_kinds
        .iter()
        .map(|k| SampleType::Quantity(*k))
        .collect();
    types.extend([
        SampleType::SleepAnalysis,
        SampleType::MindfulSession,
        SampleType::Workout,
    ]);
    types
}

async fn collect_workouts(inner: &Inner, pending: &PendingQueries) -> Vec<Workout> {
    let store = inner.health.as_ref();
    let mut listed = workouts::list_workouts(store, pending).await;
    // Only the workouts the prompt will show get their intervals resolved.
    let skip = listed.len().saturating_sub(inner.config.workout_limit);
    let resolved = join_all(
        listed[skip..]
            .iter()
            .map(|w| workouts::activity_metrics(store, w, pending)),
    )
    .await;
    for (workout, activities) in listed[skip..].iter_mut().zip(resolved) {
        workout.activities = activities;
    }
    listed
}

async fn collect_calendar(
    inner: &Inner,
    now: &DateTime<FixedOffset>,
    pending: &PendingQueries,
) -> (DayBuckets<Event>, DayBuckets<Reminder>) {
    let store = inner.calendar.as_ref();
    let (events_allowed, reminders_allowed) = tokio::join!(
        calendar::request_access(store, EntityKind::Event, pending),
        calendar::request_access(store, EntityKind::Reminder, pending),
    );

    let events = async {
        if events_allowed {
            calendar::fetch_events(store, yesterday_through_tomorrow(now), pending).await
        } else {
            Vec::new()
        }
    };
    let reminders = async {
        if reminders_allowed {
            calendar::fetch_reminders(store, pending).await
        } else {
            Vec::new()
        }
    };
    let (events, reminders) = tokio::join!(events, reminders);
    (
        calendar::classify(events, now),
        calendar::classify(reminders, now),
    )
}

async fn collect(inner: &Inner, now: DateTime<FixedOffset>, pending: &PendingQueries) -> Snapshot {
    let store = inner.health.as_ref();
    let config = &inner.config;

    pending.dispatch(1);
    let authorized = match pending
        .track(store.request_authorization(&health_types(config)))
        .await
    {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!(error = %e, "health authorization request failed");
            false
        }
    };
    if !authorized {
        tracing::info!("health authorization not granted, health data left empty");
    }

    let health_data = async {
        if authorized {
            tokio::join!(
                health::fetch_metrics(store, &config.metric_kinds, today_so_far(&now), pending),
                health::fetch_sleep(store, &now, config.sleep_days, pending),
                health::latest_mindful_session(store, &now, config.sleep_days, pending),
                collect_workouts(inner, pending),
            )
        } else {
            (Vec::new(), Vec::new(), None, Vec::new())
        }
    };
    let ((metric_samples, sleep, mindful_session, workouts), (events, reminders)) =
        tokio::join!(health_data, collect_calendar(inner, &now, pending));

    Snapshot {
        timestamp: now,
        metrics: metric_samples,
        sleep,
        mindful_session,
        workouts,
        events,
        reminders,
    }
}
