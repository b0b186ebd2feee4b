//! Narrow async seams over the device-local stores.
//!
//! The pipeline never talks to a platform API directly; everything goes
//! through these traits so adapters can be exercised against fakes or a JSON
//! export.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::types::{ActivityKind, Aggregation, Event, MetricKind, Reminder, TimeWindow};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    Quantity(MetricKind),
    SleepAnalysis,
    MindfulSession,
    Workout,
}

/// One raw sample as stored on the device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub value: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    /// Newest end date first.
    Descending,
}

/// Workout as returned by the store, before any statistics are resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: String,
    pub activity_kind: ActivityKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub device: Option<String>,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub intervals: Vec<IntervalBounds>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Event,
    Reminder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
}

impl AuthorizationStatus {
    pub fn allows_delivery(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Provisional
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Fires `seconds` after scheduling.
    TimeInterval { seconds: u64, repeats: bool },
    /// Fires at a local wall-clock time.
    Calendar {
        hour: u32,
        minute: u32,
        repeats: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
}

#[async_trait]
pub trait HealthStore: Send + Sync + 'static {
    /// Ask for read access to the given types. On `false` or an error no
    /// health query is made and the health part of the snapshot stays empty.
    async fn request_authorization(&self, types: &[SampleType]) -> Result<bool, SourceError>;

    /// Reduce the samples of `kind` in `window` with `aggregation`.
    /// `Ok(None)` means the store holds no samples for the window.
    async fn statistics(
        &self,
        kind: MetricKind,
        window: TimeWindow,
        aggregation: Aggregation,
    ) -> Result<Option<f64>, SourceError>;

    async fn samples(
        &self,
        sample_type: SampleType,
        window: TimeWindow,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<RawSample>, SourceError>;

    async fn workouts(&self) -> Result<Vec<WorkoutRecord>, SourceError>;
}

#[async_trait]
pub trait CalendarStore: Send + Sync + 'static {
    async fn request_access(&self, kind: EntityKind) -> Result<bool, SourceError>;

    async fn events_matching(&self, window: TimeWindow) -> Result<Vec<Event>, SourceError>;

    async fn reminders(&self) -> Result<Vec<Reminder>, SourceError>;
}

#[async_trait]
pub trait NotificationCenter: Send + Sync + 'static {
    async fn request_authorization(&self) -> Result<AuthorizationStatus, SourceError>;

    async fn schedule_local(&self, request: NotificationRequest) -> Result<(), SourceError>;

    async fn remove_pending(&self, ids: &[String]);
}

/// Notification center for hosts that cannot deliver local notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotificationCenter;

#[async_trait]
impl NotificationCenter for NoopNotificationCenter {
    async fn request_authorization(&self) -> Result<AuthorizationStatus, SourceError> {
        Ok(AuthorizationStatus::Denied)
    }

    async fn schedule_local(&self, _request: NotificationRequest) -> Result<(), SourceError> {
        Ok(())
    }

    async fn remove_pending(&self, _ids: &[String]) {}
}
