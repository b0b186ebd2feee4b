//! Deterministic rendering of a [`Snapshot`] into chat messages.
//!
//! Rendering depends only on the snapshot and the builder settings. The date
//! line and every local time are derived from the snapshot timestamp, so the
//! same snapshot always renders the same text.

use athena_client::ChatMessage;
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;

use crate::config::{DayOrder, PipelineConfig};
use crate::types::{Day, Event, MetricSample, Reminder, Snapshot, Workout, WorkoutActivity};

pub const SYSTEM_PROMPT: &str = "You are a helpful personal assistant that creates casual but useful, motivational daily summaries. Focus on being concise, practical, and encouraging. Dont use headers or subheaders in markdown, simply make titles and key points bold. Use 3 or 4 emojis at most.";

const DAILY_HEADER: &str = "Generate a personalized daily summary in a casual but professional tone, like JARVIS from Iron Man. Here's the data:";
const WORKOUT_HEADER: &str = "Generate a personalized workout summary in a casual but professional tone, like JARVIS from Iron Man. Here's the data:";

const DAILY_REQUESTS: &[&str] = &[
    "A greeting and quick overview",
    "Health insights and recommendations",
    "Today's priorities based on calendar events",
    "Personalized suggestions for improvement",
    "A PS with a practical tip combining health and daily tasks",
];

const WORKOUT_REQUESTS: &[&str] = &[
    "A quick recap of recent training",
    "Highlights from each workout and its intervals",
    "Recovery insights from heart rate, sleep and mindfulness",
    "Suggestions for the next session",
];

pub const MIN_PARAGRAPHS: u8 = 2;
pub const MAX_PARAGRAPHS: u8 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    #[default]
    Daily,
    Workout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptBuilder {
    pub workout_limit: usize,
    pub day_order: DayOrder,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

fn day_label(day: Day) -> &'static str {
    match day {
        Day::Yesterday => "Yesterday",
        Day::Today => "Today",
        Day::Tomorrow => "Tomorrow",
    }
}

fn local(ts: DateTime<Utc>, snapshot: &Snapshot) -> DateTime<FixedOffset> {
    ts.with_timezone(snapshot.timestamp.offset())
}

fn metric_line(sample: &MetricSample) -> String {
    format!(
        "{}: {:.*} {}",
        sample.kind.name(),
        sample.kind.precision(),
        sample.value,
        sample.unit
    )
}

fn event_line(event: &Event, snapshot: &Snapshot) -> String {
    let mut line = if event.is_all_day {
        format!("- All day: {}", event.title)
    } else {
        format!(
            "- {}-{}: {}",
            local(event.start, snapshot).format("%H:%M"),
            local(event.end, snapshot).format("%H:%M"),
            event.title
        )
    };
    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        let _ = write!(line, " at {location}");
    }
    line
}

fn reminder_line(reminder: &Reminder, snapshot: &Snapshot) -> String {
    let mut line = format!("- {}", reminder.title);
    if let Some(due) = reminder.due_date {
        let _ = write!(line, " (due {})", local(due, snapshot).format("%H:%M"));
    }
    if reminder.priority > 0 {
        let _ = write!(line, " [priority {}]", reminder.priority);
    }
    line
}

fn activity_line(index: usize, activity: &WorkoutActivity) -> String {
    let mut parts = vec![format!("{:.1} min", activity.duration_seconds() / 60.0)];
    if let Some(kcal) = activity.calories {
        parts.push(format!("{kcal:.0} kcal"));
    }
    if let Some(meters) = activity.distance_meters {
        parts.push(format!("{:.2} km", meters / 1000.0));
    }
    if let Some(pace) = activity.pace_sec_per_km {
        parts.push(format!("pace {:.2} min/km", pace / 60.0));
    }
    if let Some(hr) = activity.heart_rate {
        parts.push(format!(
            "HR avg {:.0} bpm (min {:.0}, max {:.0})",
            hr.avg, hr.min, hr.max
        ));
    }
    format!("  Interval {}: {}", index + 1, parts.join(", "))
}

fn workout_lines(out: &mut String, workout: &Workout, snapshot: &Snapshot) {
    let _ = write!(
        out,
        "- {} on {}, {:.1} minutes",
        workout.activity_kind.name(),
        local(workout.start, snapshot).format("%Y-%m-%d %H:%M"),
        workout.duration_seconds / 60.0
    );
    if let Some(device) = workout.device.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, " ({device})");
    }
    out.push('\n');
    for (i, activity) in workout.activities.iter().enumerate() {
        out.push_str(&activity_line(i, activity));
        out.push('\n');
    }
}

impl PromptBuilder {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            workout_limit: config.workout_limit,
            day_order: config.day_order,
        }
    }

    fn days(&self) -> &'static [Day] {
        match self.day_order {
            DayOrder::TodayTomorrow => &[Day::Today, Day::Tomorrow],
            DayOrder::YesterdayTodayTomorrow => &[Day::Yesterday, Day::Today, Day::Tomorrow],
        }
    }

    fn health_sections(&self, out: &mut String, snapshot: &Snapshot) {
        out.push_str("\nHealth Metrics:\n");
        if snapshot.metrics.is_empty() {
            out.push_str("No health metrics available.\n");
        }
        for sample in &snapshot.metrics {
            out.push_str(&metric_line(sample));
            out.push('\n');
        }

        out.push_str("\nSleep:\n");
        if snapshot.sleep.is_empty() {
            out.push_str("No sleep data recorded.\n");
        }
        for entry in &snapshot.sleep {
            let _ = writeln!(
                out,
                "- {}: {:.2} hours",
                entry.date.format("%Y-%m-%d"),
                entry.duration_minutes / 60.0
            );
        }

        out.push_str("\nMindful Session:\n");
        match &snapshot.mindful_session {
            Some(session) => {
                let _ = writeln!(
                    out,
                    "- {:.1} minutes on {}",
                    session.duration_minutes,
                    local(session.start, snapshot).format("%Y-%m-%d %H:%M")
                );
            }
            None => out.push_str("No mindful session recorded.\n"),
        }

        out.push_str("\nRecent Workouts:\n");
        let mut any = false;
        for workout in snapshot.recent_workouts(self.workout_limit) {
            any = true;
            workout_lines(out, workout, snapshot);
        }
        if !any {
            out.push_str("No workouts recorded.\n");
        }
    }

    fn calendar_sections(&self, out: &mut String, snapshot: &Snapshot) {
        for &day in self.days() {
            let label = day_label(day);
            let _ = writeln!(out, "\n{label}'s Events:");
            let events = snapshot.events.get(day);
            if events.is_empty() {
                let _ = writeln!(out, "No events scheduled for {}.", label.to_lowercase());
            }
            for event in events {
                out.push_str(&event_line(event, snapshot));
                out.push('\n');
            }
        }
        for &day in self.days() {
            let label = day_label(day);
            let _ = writeln!(out, "\n{label}'s Reminders:");
            let reminders = snapshot.reminders.get(day);
            if reminders.is_empty() {
                let _ = writeln!(out, "No reminders due {}.", label.to_lowercase());
            }
            for reminder in reminders {
                out.push_str(&reminder_line(reminder, snapshot));
                out.push('\n');
            }
        }
    }

    /// The user prompt for `kind`.
    pub fn render_kind(&self, snapshot: &Snapshot, kind: SummaryKind) -> String {
        let (header, requests) = match kind {
            SummaryKind::Daily => (DAILY_HEADER, DAILY_REQUESTS),
            SummaryKind::Workout => (WORKOUT_HEADER, WORKOUT_REQUESTS),
        };

        let mut out = String::with_capacity(2048);
        out.push_str(header);
        out.push_str("\n\n");
        let _ = writeln!(
            out,
            "Date: {}",
            snapshot.timestamp.format("%A, %B %-d, %Y at %H:%M")
        );

        self.health_sections(&mut out, snapshot);
        if kind == SummaryKind::Daily {
            self.calendar_sections(&mut out, snapshot);
        }

        out.push_str("\nPlease create a summary that includes:\n");
        for (i, request) in requests.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, request);
        }
        out
    }

    /// The daily summary prompt.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        self.render_kind(snapshot, SummaryKind::Daily)
    }

    pub fn messages_for(&self, snapshot: &Snapshot, kind: SummaryKind) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(self.render_kind(snapshot, kind)),
        ]
    }

    pub fn messages(&self, snapshot: &Snapshot) -> Vec<ChatMessage> {
        self.messages_for(snapshot, SummaryKind::Daily)
    }
}

/// Free-text summarizer conversation. `paragraphs` is clamped to 2..=5.
pub fn summarize_text(text: &str, paragraphs: u8) -> Vec<ChatMessage> {
    let paragraphs = paragraphs.clamp(MIN_PARAGRAPHS, MAX_PARAGRAPHS);
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Summarize the following text in {paragraphs} concise paragraphs, focusing on the main points and clarity.\n\n{text}"
        )),
    ]
}
