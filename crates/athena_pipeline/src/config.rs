use chrono::NaiveTime;

use crate::error::{PipelineError, PipelineResult};
use crate::types::MetricKind;

pub const DEFAULT_WORKOUT_LIMIT: usize = 5;
pub const DEFAULT_SLEEP_DAYS: u32 = 7;

/// Which calendar days the prompt lists, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DayOrder {
    #[default]
    TodayTomorrow,
    YesterdayTodayTomorrow,
}

impl DayOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "today-tomorrow" | "today,tomorrow" => Some(DayOrder::TodayTomorrow),
            "yesterday-today-tomorrow" | "yesterday,today,tomorrow" => {
                Some(DayOrder::YesterdayTodayTomorrow)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub metric_kinds: Vec<MetricKind>,
    pub workout_limit: usize,
    pub day_order: DayOrder,
    pub sleep_days: u32,
    pub reminder_time: NaiveTime,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metric_kinds: MetricKind::DAILY.to_vec(),
            workout_limit: DEFAULT_WORKOUT_LIMIT,
            day_order: DayOrder::default(),
            sleep_days: DEFAULT_SLEEP_DAYS,
            reminder_time: default_reminder_time(),
        }
    }
}

fn default_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 30, 0).unwrap_or(NaiveTime::MIN)
}

fn invalid(var: &str, raw: &str) -> PipelineError {
    PipelineError::Config(format!("invalid {var}: {raw}"))
}

impl PipelineConfig {
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> PipelineResult<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = get("ATHENA_WORKOUT_LIMIT") {
            config.workout_limit = raw
                .trim()
                .parse()
                .map_err(|_| invalid("ATHENA_WORKOUT_LIMIT", &raw))?;
        }
        if let Some(raw) = get("ATHENA_DAY_ORDER") {
            config.day_order =
                DayOrder::parse(&raw).ok_or_else(|| invalid("ATHENA_DAY_ORDER", &raw))?;
        }
        if let Some(raw) = get("ATHENA_SLEEP_DAYS") {
            let days: u32 = raw
                .trim()
                .parse()
                .map_err(|_| invalid("ATHENA_SLEEP_DAYS", &raw))?;
            if days == 0 {
                return Err(PipelineError::Config(
                    "ATHENA_SLEEP_DAYS must be positive".into(),
                ));
            }
            config.sleep_days = days;
        }
        if let Some(raw) = get("ATHENA_REMINDER_TIME") {
            config.reminder_time = NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .map_err(|_| invalid("ATHENA_REMINDER_TIME", &raw))?;
        }
        if let Some(raw) = get("ATHENA_METRIC_KINDS") {
            config.metric_kinds = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| MetricKind::from_name(s).ok_or_else(|| invalid("ATHENA_METRIC_KINDS", s)))
                .collect::<PipelineResult<Vec<_>>>()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = PipelineConfig::from_env_with(|_| None).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.workout_limit, 5);
        assert_eq!(config.day_order, DayOrder::TodayTomorrow);
        assert_eq!(config.reminder_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    }

    #[test]
    fn reads_overrides() {
        let vars = env(&[
            ("ATHENA_WORKOUT_LIMIT", "3"),
            ("ATHENA_DAY_ORDER", "yesterday-today-tomorrow"),
            ("ATHENA_SLEEP_DAYS", "14"),
            ("ATHENA_REMINDER_TIME", "07:45"),
            ("ATHENA_METRIC_KINDS", "StepCount, HeartRate,StepCount"),
        ]);
        let config = PipelineConfig::from_env_with(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.workout_limit, 3);
        assert_eq!(config.day_order, DayOrder::YesterdayTodayTomorrow);
        assert_eq!(config.sleep_days, 14);
        assert_eq!(config.reminder_time, NaiveTime::from_hms_opt(7, 45, 0).unwrap());
        assert_eq!(
            config.metric_kinds,
            vec![MetricKind::StepCount, MetricKind::HeartRate, MetricKind::StepCount]
        );
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for (key, value) in [
            ("ATHENA_WORKOUT_LIMIT", "many"),
            ("ATHENA_DAY_ORDER", "tomorrow-only"),
            ("ATHENA_SLEEP_DAYS", "0"),
            ("ATHENA_REMINDER_TIME", "25:00"),
            ("ATHENA_METRIC_KINDS", "StepCount,Mood"),
        ] {
            let vars = env(&[(key, value)]);
            let err = PipelineConfig::from_env_with(|k| vars.get(k).cloned()).unwrap_err();
            assert!(matches!(err, PipelineError::Config(_)), "{key}={value}");
        }
    }
}
