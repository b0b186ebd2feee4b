//! Shared fakes for the device stores and the chat endpoint used by unit tests.
#![cfg(test)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

use athena_client::{ChatClient, ChatError, ChatMessage};

use crate::error::SourceError;
use crate::export::{aggregate, select};
use crate::store::{
    AuthorizationStatus, CalendarStore, EntityKind, HealthStore, NotificationCenter,
    NotificationRequest, RawSample, SampleType, SortOrder, WorkoutRecord,
};
use crate::types::{ActivityKind, Aggregation, Event, MetricKind, Reminder, TimeWindow};

/// A wall-clock instant in UTC+10.
pub fn sydney(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(10 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
}

pub fn workout_record(
    id: &str,
    kind: ActivityKind,
    start: DateTime<Utc>,
    minutes: i64,
) -> WorkoutRecord {
    WorkoutRecord {
        id: id.to_string(),
        activity_kind: kind,
        start,
        end: start + Duration::minutes(minutes),
        device: Some("Watch".to_string()),
        metadata: BTreeMap::new(),
        intervals: Vec::new(),
    }
}

pub fn event(id: &str, title: &str, start: DateTime<Utc>) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        start,
        end: start + Duration::hours(1),
        is_all_day: false,
        location: None,
        notes: None,
    }
}

pub fn reminder(id: &str, title: &str, due: Option<DateTime<Utc>>) -> Reminder {
    Reminder {
        id: id.to_string(),
        title: title.to_string(),
        due_date: due,
        notes: None,
        priority: 0,
        is_completed: false,
    }
}

/// In-memory health store. Statistics come from explicit answers first and
/// fall back to reducing the configured quantity samples.
#[derive(Default)]
pub struct FakeHealthStore {
    authorization: Option<Result<bool, SourceError>>,
    answers: HashMap<MetricKind, Result<Option<f64>, SourceError>>,
    quantities: HashMap<MetricKind, Vec<RawSample>>,
    sleep: Vec<RawSample>,
    mindful: Vec<RawSample>,
    workouts: Vec<WorkoutRecord>,
    failing: HashSet<SampleType>,
    workouts_fail: bool,
    gate: Option<Arc<Semaphore>>,
    workout_delays: Mutex<VecDeque<std::time::Duration>>,
    calls: Mutex<Vec<MetricKind>>,
}

impl FakeHealthStore {
    /// Answer authorization requests with `result` instead of granting.
    pub fn with_authorization(mut self, result: Result<bool, SourceError>) -> Self {
        self.authorization = Some(result);
        self
    }

    pub fn with_statistic(
        mut self,
        kind: MetricKind,
        answer: Result<Option<f64>, SourceError>,
    ) -> Self {
        self.answers.insert(kind, answer);
        self
    }

    pub fn with_quantity(mut self, kind: MetricKind, samples: Vec<RawSample>) -> Self {
        self.quantities.insert(kind, samples);
        self
    }

    pub fn with_sleep(mut self, samples: Vec<RawSample>) -> Self {
        self.sleep = samples;
        self
    }

    pub fn with_mindful(mut self, samples: Vec<RawSample>) -> Self {
        self.mindful = samples;
        self
    }

    pub fn with_workouts(mut self, workouts: Vec<WorkoutRecord>) -> Self {
        self.workouts = workouts;
        self
    }

    pub fn failing_samples(mut self, sample_type: SampleType) -> Self {
        self.failing.insert(sample_type);
        self
    }

    pub fn failing_workouts(mut self) -> Self {
        self.workouts_fail = true;
        self
    }

    /// Every statistics call waits for a permit from `gate` before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Successive `workouts()` calls sleep for these durations in turn.
    pub fn with_workout_delays(self, delays: Vec<std::time::Duration>) -> Self {
        Self {
            workout_delays: Mutex::new(delays.into()),
            ..self
        }
    }

    pub async fn statistics_calls(&self) -> Vec<MetricKind> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl HealthStore for FakeHealthStore {
    async fn request_authorization(&self, _types: &[SampleType]) -> Result<bool, SourceError> {
        self.authorization.clone().unwrap_or(Ok(true))
    }

    async fn statistics(
        &self,
        kind: MetricKind,
        window: TimeWindow,
        aggregation: Aggregation,
    ) -> Result<Option<f64>, SourceError> {
        self.calls.lock().await.push(kind);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| SourceError::Query(e.to_string()))?
                .forget();
        }
        if let Some(answer) = self.answers.get(&kind) {
            return answer.clone();
        }
        Ok(self
            .quantities
            .get(&kind)
            .and_then(|s| aggregate(s, window, aggregation)))
    }

    async fn samples(
        &self,
        sample_type: SampleType,
        window: TimeWindow,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<RawSample>, SourceError> {
        if self.failing.contains(&sample_type) {
            return Err(SourceError::Query(format!("{sample_type:?} unavailable")));
        }
        let source: &[RawSample] = match sample_type {
            SampleType::Quantity(kind) => {
                self.quantities.get(&kind).map(Vec::as_slice).unwrap_or(&[])
            }
            SampleType::SleepAnalysis => &self.sleep,
            SampleType::MindfulSession => &self.mindful,
            SampleType::Workout => &[],
        };
        Ok(select(source, window, sort, limit))
    }

    async fn workouts(&self) -> Result<Vec<WorkoutRecord>, SourceError> {
        let delay = self.workout_delays.lock().await.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.workouts_fail {
            return Err(SourceError::PermissionDenied("workouts".into()));
        }
        Ok(self.workouts.clone())
    }
}

#[derive(Default)]
pub struct FakeCalendarStore {
    events: Vec<Event>,
    reminders: Vec<Reminder>,
    denied: HashSet<EntityKind>,
}

impl FakeCalendarStore {
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn with_reminders(mut self, reminders: Vec<Reminder>) -> Self {
        self.reminders = reminders;
        self
    }

    pub fn deny(mut self, kind: EntityKind) -> Self {
        self.denied.insert(kind);
        self
    }
}

#[async_trait]
impl CalendarStore for FakeCalendarStore {
    async fn request_access(&self, kind: EntityKind) -> Result<bool, SourceError> {
        Ok(!self.denied.contains(&kind))
    }

    async fn events_matching(&self, window: TimeWindow) -> Result<Vec<Event>, SourceError> {
        Ok(self
            .events
            .iter()
            .filter(|e| window.contains(e.start))
            .cloned()
            .collect())
    }

    async fn reminders(&self) -> Result<Vec<Reminder>, SourceError> {
        Ok(self.reminders.clone())
    }
}

/// Notification center that records every call in order.
pub struct RecordingNotificationCenter {
    status: AuthorizationStatus,
    pub log: Mutex<Vec<String>>,
    pub scheduled: Mutex<Vec<NotificationRequest>>,
}

impl RecordingNotificationCenter {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status,
            log: Mutex::new(Vec::new()),
            scheduled: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationCenter for RecordingNotificationCenter {
    async fn request_authorization(&self) -> Result<AuthorizationStatus, SourceError> {
        self.log.lock().await.push("authorize".into());
        Ok(self.status)
    }

    async fn schedule_local(&self, request: NotificationRequest) -> Result<(), SourceError> {
        self.log.lock().await.push(format!("schedule:{}", request.id));
        self.scheduled.lock().await.push(request);
        Ok(())
    }

    async fn remove_pending(&self, ids: &[String]) {
        self.log.lock().await.push(format!("remove:{}", ids.join(",")));
    }
}

pub enum MockReply {
    Text(String),
    Status(u16),
    NoKey,
}

/// Chat client that answers from a script and records each conversation.
pub struct MockChatClient {
    reply: MockReply,
    delay: Option<std::time::Duration>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatClient {
    pub fn replying(text: &str) -> Self {
        Self::new(MockReply::Text(text.to_string()))
    }

    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn send(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        self.calls.lock().await.push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Status(status) => Err(ChatError::Http {
                status: *status,
                body: String::new(),
            }),
            MockReply::NoKey => Err(ChatError::AuthMissing),
        }
    }
}
