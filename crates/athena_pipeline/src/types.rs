//! Data model shared by the source adapters, the aggregator and the prompt
//! builder.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Half-open `[start, end)` query window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// How a metric's samples are reduced to one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    CumulativeSum,
    MostRecent,
    DiscreteAverage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    StepCount,
    HeartRate,
    ActiveEnergy,
    BasalEnergy,
    DistanceWalkingRunning,
    DistanceCycling,
    DistanceSwimming,
    FlightsClimbed,
    StandTime,
    ExerciseTime,
    TimeInDaylight,
    BodyMass,
    BodyFatPercentage,
    BodyMassIndex,
    LeanBodyMass,
    BodyTemperature,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    OxygenSaturation,
    RespiratoryRate,
    RestingHeartRate,
    WalkingHeartRateAverage,
    HeartRateVariability,
    Vo2Max,
}

impl MetricKind {
    /// Kinds fetched for the daily overview, in render order.
    pub const DAILY: &'static [MetricKind] = &[
        MetricKind::StepCount,
        MetricKind::HeartRate,
        MetricKind::ActiveEnergy,
        MetricKind::BasalEnergy,
        MetricKind::DistanceWalkingRunning,
        MetricKind::FlightsClimbed,
        MetricKind::StandTime,
        MetricKind::ExerciseTime,
        MetricKind::TimeInDaylight,
        MetricKind::BodyMass,
        MetricKind::BodyFatPercentage,
        MetricKind::BodyMassIndex,
        MetricKind::LeanBodyMass,
        MetricKind::BodyTemperature,
        MetricKind::BloodPressureSystolic,
        MetricKind::BloodPressureDiastolic,
        MetricKind::OxygenSaturation,
        MetricKind::RespiratoryRate,
        MetricKind::RestingHeartRate,
        MetricKind::WalkingHeartRateAverage,
        MetricKind::HeartRateVariability,
        MetricKind::Vo2Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::StepCount => "StepCount",
            MetricKind::HeartRate => "HeartRate",
            MetricKind::ActiveEnergy => "ActiveEnergy",
            MetricKind::BasalEnergy => "BasalEnergy",
            MetricKind::DistanceWalkingRunning => "DistanceWalkingRunning",
            MetricKind::DistanceCycling => "DistanceCycling",
            MetricKind::DistanceSwimming => "DistanceSwimming",
            MetricKind::FlightsClimbed => "FlightsClimbed",
            MetricKind::StandTime => "StandTime",
            MetricKind::ExerciseTime => "ExerciseTime",
            MetricKind::TimeInDaylight => "TimeInDaylight",
            MetricKind::BodyMass => "BodyMass",
            MetricKind::BodyFatPercentage => "BodyFatPercentage",
            MetricKind::BodyMassIndex => "BodyMassIndex",
            MetricKind::LeanBodyMass => "LeanBodyMass",
            MetricKind::BodyTemperature => "BodyTemperature",
            MetricKind::BloodPressureSystolic => "BloodPressureSystolic",
            MetricKind::BloodPressureDiastolic => "BloodPressureDiastolic",
            MetricKind::OxygenSaturation => "OxygenSaturation",
            MetricKind::RespiratoryRate => "RespiratoryRate",
            MetricKind::RestingHeartRate => "RestingHeartRate",
            MetricKind::WalkingHeartRateAverage => "WalkingHeartRateAverage",
            MetricKind::HeartRateVariability => "HeartRateVariability",
            MetricKind::Vo2Max => "Vo2Max",
        }
    }

    /// Parse a kind from its [`name`](Self::name), ignoring ASCII case.
    pub fn from_name(s: &str) -> Option<Self> {
        MetricKind::DAILY
            .iter()
            .chain([MetricKind::DistanceCycling, MetricKind::DistanceSwimming].iter())
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
    }

    pub fn aggregation(self) -> Aggregation {
        use MetricKind::*;
        match self {
            StepCount | ActiveEnergy | BasalEnergy | DistanceWalkingRunning | DistanceCycling
            | DistanceSwimming | FlightsClimbed | StandTime | ExerciseTime | TimeInDaylight => {
                Aggregation::CumulativeSum
            }
            WalkingHeartRateAverage => Aggregation::DiscreteAverage,
            HeartRate | BodyMass | BodyFatPercentage | BodyMassIndex | LeanBodyMass
            | BodyTemperature | BloodPressureSystolic | BloodPressureDiastolic
            | OxygenSaturation | RespiratoryRate | RestingHeartRate | HeartRateVariability
            | Vo2Max => Aggregation::MostRecent,
        }
    }

    /// Unit the store reports this kind in.
    pub fn unit(self) -> &'static str {
        use MetricKind::*;
        match self {
            StepCount | FlightsClimbed => "count",
            HeartRate | RestingHeartRate | WalkingHeartRateAverage => "bpm",
            ActiveEnergy | BasalEnergy => "kcal",
            DistanceWalkingRunning | DistanceCycling | DistanceSwimming => "m",
            StandTime | ExerciseTime | TimeInDaylight => "min",
            BodyMass | LeanBodyMass => "lb",
            BodyFatPercentage | OxygenSaturation => "%",
            BodyMassIndex => "kg/m2",
            BodyTemperature => "degF",
            BloodPressureSystolic | BloodPressureDiastolic => "mmHg",
            RespiratoryRate => "breaths/min",
            HeartRateVariability => "ms",
            Vo2Max => "ml/kg/min",
        }
    }

    /// Fractional digits used when rendering a value of this kind.
    pub fn precision(self) -> usize {
        use MetricKind::*;
        match self {
            StepCount | FlightsClimbed | HeartRate | RestingHeartRate | WalkingHeartRateAverage
            | StandTime | ExerciseTime | TimeInDaylight | BloodPressureSystolic
            | BloodPressureDiastolic => 0,
            _ => 1,
        }
    }

    /// Whether "no samples" means a true zero for this kind.
    pub fn zero_when_empty(self) -> bool {
        self.aggregation() == Aggregation::CumulativeSum
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub kind: MetricKind,
    pub value: f64,
    pub unit: String,
}

impl MetricSample {
    pub fn new(kind: MetricKind, value: f64) -> Self {
        Self {
            kind,
            value,
            unit: kind.unit().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SleepEntry {
    pub date: NaiveDate,
    pub duration_minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MindfulSession {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Running,
    Walking,
    Hiking,
    Cycling,
    Swimming,
    Rowing,
    Elliptical,
    Yoga,
    FunctionalStrengthTraining,
    TraditionalStrengthTraining,
    HighIntensityIntervalTraining,
    #[serde(other)]
    Other,
}

impl ActivityKind {
    pub fn name(self) -> &'static str {
        match self {
            ActivityKind::Running => "Running",
            ActivityKind::Walking => "Walking",
            ActivityKind::Hiking => "Hiking",
            ActivityKind::Cycling => "Cycling",
            ActivityKind::Swimming => "Swimming",
            ActivityKind::Rowing => "Rowing",
            ActivityKind::Elliptical => "Elliptical",
            ActivityKind::Yoga => "Yoga",
            ActivityKind::FunctionalStrengthTraining => "Functional Strength Training",
            ActivityKind::TraditionalStrengthTraining => "Traditional Strength Training",
            ActivityKind::HighIntensityIntervalTraining => "High Intensity Interval Training",
            ActivityKind::Other => "Workout",
        }
    }

    /// The distance quantity recorded for this kind of activity.
    pub fn distance_kind(self) -> MetricKind {
        match self {
            ActivityKind::Cycling => MetricKind::DistanceCycling,
            ActivityKind::Swimming => MetricKind::DistanceSwimming,
            _ => MetricKind::DistanceWalkingRunning,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl HeartRateSummary {
    /// Summarize readings; `None` for an empty slice.
    pub fn from_readings(readings: &[f64]) -> Option<Self> {
        let first = *readings.first()?;
        let (min, max, sum) = readings
            .iter()
            .fold((first, first, 0.0), |(lo, hi, sum), &v| {
                (lo.min(v), hi.max(v), sum + v)
            });
        Some(Self {
            min,
            max,
            avg: sum / readings.len() as f64,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutActivity {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub calories: Option<f64>,
    pub distance_meters: Option<f64>,
    pub pace_sec_per_km: Option<f64>,
    pub heart_rate: Option<HeartRateSummary>,
}

impl WorkoutActivity {
    /// An interval with bounds only; statistics are resolved later.
    pub fn bounds(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            calories: None,
            distance_meters: None,
            pace_sec_per_km: None,
            heart_rate: None,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Seconds per kilometre, defined only for positive distance and duration.
pub fn pace_sec_per_km(duration_seconds: f64, distance_meters: Option<f64>) -> Option<f64> {
    let distance_km = distance_meters? / 1000.0;
    if distance_km > 0.0 && duration_seconds > 0.0 {
        Some(duration_seconds / distance_km)
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub activity_kind: ActivityKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: f64,
    pub device: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub activities: Vec<WorkoutActivity>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_completed: bool,
}

/// Items that can be placed into a yesterday/today/tomorrow bucket.
pub trait DayAnchored {
    /// The timestamp whose local day decides the bucket, if any.
    fn anchor(&self) -> Option<DateTime<Utc>>;
}

impl DayAnchored for Event {
    fn anchor(&self) -> Option<DateTime<Utc>> {
        Some(self.start)
    }
}

impl DayAnchored for Reminder {
    fn anchor(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Day {
    Yesterday,
    Today,
    Tomorrow,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayBuckets<T> {
    pub yesterday: Vec<T>,
    pub today: Vec<T>,
    pub tomorrow: Vec<T>,
}

impl<T> Default for DayBuckets<T> {
    fn default() -> Self {
        Self {
            yesterday: Vec::new(),
            today: Vec::new(),
            tomorrow: Vec::new(),
        }
    }
}

impl<T> DayBuckets<T> {
    pub fn get(&self, day: Day) -> &[T] {
        match day {
            Day::Yesterday => &self.yesterday,
            Day::Today => &self.today,
            Day::Tomorrow => &self.tomorrow,
        }
    }

    pub fn get_mut(&mut self, day: Day) -> &mut Vec<T> {
        match day {
            Day::Yesterday => &mut self.yesterday,
            Day::Today => &mut self.today,
            Day::Tomorrow => &mut self.tomorrow,
        }
    }

    pub fn len(&self) -> usize {
        self.yesterday.len() + self.today.len() + self.tomorrow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The fully joined result of one fetch cycle. Never mutated after
/// construction; a later cycle replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<chrono::FixedOffset>,
    pub metrics: Vec<MetricSample>,
    pub sleep: Vec<SleepEntry>,
    pub mindful_session: Option<MindfulSession>,
    pub workouts: Vec<Workout>,
    pub events: DayBuckets<Event>,
    pub reminders: DayBuckets<Reminder>,
}

impl Snapshot {
    pub fn empty(timestamp: DateTime<chrono::FixedOffset>) -> Self {
        Self {
            timestamp,
            metrics: Vec::new(),
            sleep: Vec::new(),
            mindful_session: None,
            workouts: Vec::new(),
            events: DayBuckets::default(),
            reminders: DayBuckets::default(),
        }
    }

    pub fn metric(&self, kind: MetricKind) -> Option<&MetricSample> {
        self.metrics.iter().find(|m| m.kind == kind)
    }

    /// The most recent `n` workouts, newest first.
    pub fn recent_workouts(&self, n: usize) -> impl Iterator<Item = &Workout> {
        let mut sorted: Vec<&Workout> = self.workouts.iter().collect();
        sorted.sort_by(|a, b| b.start.cmp(&a.start).then_with(|| a.id.cmp(&b.id)));
        sorted.into_iter().take(n)
    }
}
