//! A store backed by a JSON export of the device's health and calendar data.
//!
//! Used by the `athena` binary for local runs and by the integration tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult, SourceError};
use crate::store::{
    CalendarStore, EntityKind, HealthStore, RawSample, SampleType, SortOrder, WorkoutRecord,
};
use crate::types::{Aggregation, Event, MetricKind, Reminder, TimeWindow};

fn granted() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default = "granted")]
    pub health: bool,
    #[serde(default = "granted")]
    pub events: bool,
    #[serde(default = "granted")]
    pub reminders: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            health: true,
            events: true,
            reminders: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportStore {
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub quantities: BTreeMap<MetricKind, Vec<RawSample>>,
    #[serde(default)]
    pub sleep: Vec<RawSample>,
    #[serde(default)]
    pub mindful: Vec<RawSample>,
    #[serde(default)]
    pub workouts: Vec<WorkoutRecord>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

/// Reduce the samples starting inside `window`. `None` when there are none.
pub fn aggregate(
    samples: &[RawSample],
    window: TimeWindow,
    aggregation: Aggregation,
) -> Option<f64> {
    let in_window: Vec<&RawSample> = samples.iter().filter(|s| window.contains(s.start)).collect();
    if in_window.is_empty() {
        return None;
    }
    match aggregation {
        Aggregation::CumulativeSum => Some(in_window.iter().map(|s| s.value).sum()),
        Aggregation::MostRecent => in_window.iter().max_by_key(|s| s.end).map(|s| s.value),
        Aggregation::DiscreteAverage => {
            Some(in_window.iter().map(|s| s.value).sum::<f64>() / in_window.len() as f64)
        }
    }
}

/// Samples starting inside `window`, sorted and truncated.
pub fn select(
    samples: &[RawSample],
    window: TimeWindow,
    sort: SortOrder,
    limit: Option<usize>,
) -> Vec<RawSample> {
    let mut out: Vec<RawSample> = samples
        .iter()
        .filter(|s| window.contains(s.start))
        .copied()
        .collect();
    match sort {
        SortOrder::Ascending => out.sort_by_key(|s| s.start),
        SortOrder::Descending => out.sort_by(|a, b| b.end.cmp(&a.end)),
    }
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

impl ExportStore {
    pub fn from_json(raw: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Export(format!("{}: {e}", path.display())))?;
        let store = Self::from_json(&raw)
            .map_err(|e| PipelineError::Export(format!("{}: {e}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            workouts = store.workouts.len(),
            events = store.events.len(),
            reminders = store.reminders.len(),
            "loaded export"
        );
        Ok(store)
    }

    fn check_health(&self) -> Result<(), SourceError> {
        if self.permissions.health {
            Ok(())
        } else {
            Err(SourceError::PermissionDenied("health data".into()))
        }
    }
}

#[async_trait]
impl HealthStore for ExportStore {
    async fn request_authorization(&self, _types: &[SampleType]) -> Result<bool, SourceError> {
        Ok(self.permissions.health)
    }

    async fn statistics(
        &self,
        kind: MetricKind,
        window: TimeWindow,
        aggregation: Aggregation,
    ) -> Result<Option<f64>, SourceError> {
        self.check_health()?;
        Ok(self
            .quantities
            .get(&kind)
            .and_then(|samples| aggregate(samples, window, aggregation)))
    }

    async fn samples(
        &self,
        sample_type: SampleType,
        window: TimeWindow,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<RawSample>, SourceError> {
        self.check_health()?;
        let source: &[RawSample] = match sample_type {
            SampleType::Quantity(kind) => self
                .quantities
                .get(&kind)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            SampleType::SleepAnalysis => &self.sleep,
            SampleType::MindfulSession => &self.mindful,
            SampleType::Workout => {
                return Err(SourceError::Query("workouts are not sample data".into()));
            }
        };
        Ok(select(source, window, sort, limit))
    }

    async fn workouts(&self) -> Result<Vec<WorkoutRecord>, SourceError> {
        self.check_health()?;
        Ok(self.workouts.clone())
    }
}

#[async_trait]
impl CalendarStore for ExportStore {
    async fn request_access(&self, kind: EntityKind) -> Result<bool, SourceError> {
        Ok(match kind {
            EntityKind::Event => self.permissions.events,
            EntityKind::Reminder => self.permissions.reminders,
        })
    }

    async fn events_matching(&self, window: TimeWindow) -> Result<Vec<Event>, SourceError> {
        if !self.permissions.events {
            return Err(SourceError::PermissionDenied("calendar".into()));
        }
        // Overlap, so an event that started before the window still shows.
        Ok(self
            .events
            .iter()
            .filter(|e| e.start < window.end && e.end > window.start)
            .cloned()
            .collect())
    }

    async fn reminders(&self) -> Result<Vec<Reminder>, SourceError> {
        if !self.permissions.reminders {
            return Err(SourceError::PermissionDenied("reminders".into()));
        }
        Ok(self.reminders.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 14, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::hours(10))
    }

    fn sample(offset_min: i64, value: f64) -> RawSample {
        let start = window().start + Duration::minutes(offset_min);
        RawSample {
            start,
            end: start + Duration::minutes(1),
            value,
        }
    }

    #[test]
    fn aggregate_modes() {
        let samples = [sample(-5, 999.0), sample(10, 60.0), sample(30, 80.0), sample(20, 70.0)];
        assert_eq!(aggregate(&samples, window(), Aggregation::CumulativeSum), Some(210.0));
        assert_eq!(aggregate(&samples, window(), Aggregation::MostRecent), Some(80.0));
        assert_eq!(aggregate(&samples, window(), Aggregation::DiscreteAverage), Some(70.0));
        assert_eq!(aggregate(&samples[..1], window(), Aggregation::CumulativeSum), None);
    }

    #[test]
    fn select_sorts_and_limits() {
        let samples = [sample(10, 1.0), sample(30, 3.0), sample(20, 2.0)];
        let newest = select(&samples, window(), SortOrder::Descending, Some(1));
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].value, 3.0);
    }

    #[tokio::test]
    async fn denied_health_permission_is_an_error() {
        let store = ExportStore::from_json(r#"{"permissions": {"health": false}}"#).unwrap();
        let err = store
            .statistics(MetricKind::StepCount, window(), Aggregation::CumulativeSum)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::PermissionDenied(_)));
        assert!(store.request_access(EntityKind::Event).await.unwrap());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "quantities": {{
                    "StepCount": [{{"start": "2025-05-01T15:00:00Z", "end": "2025-05-01T15:10:00Z", "value": 1200}}]
                }},
                "reminders": [{{"id": "r1", "title": "Water plants", "due_date": null, "notes": null}}]
            }}"#
        )
        .unwrap();
        let store = ExportStore::from_path(file.path()).unwrap();
        assert_eq!(store.quantities[&MetricKind::StepCount].len(), 1);
        assert_eq!(store.reminders[0].priority, 0);
        assert!(store.permissions.events);
    }

    #[test]
    fn missing_file_is_export_error() {
        let err = ExportStore::from_path("/nonexistent/athena-export.json").unwrap_err();
        assert!(matches!(err, PipelineError::Export(_)));
    }
}
