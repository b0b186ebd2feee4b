//! Calendar events and reminders, bucketed into yesterday/today/tomorrow.

use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;

use super::PendingQueries;
use crate::store::{CalendarStore, EntityKind};
use crate::types::{Day, DayAnchored, DayBuckets, Event, Reminder, TimeWindow};
use crate::utils::local_day;

/// Ask for access to `kind`. Errors count as denial.
pub async fn request_access(
    store: &dyn CalendarStore,
    kind: EntityKind,
    pending: &PendingQueries,
) -> bool {
    pending.dispatch(1);
    match pending.track(store.request_access(kind)).await {
        Ok(true) => true,
        Ok(false) => {
            tracing::info!(?kind, "calendar access denied");
            false
        }
        Err(e) => {
            tracing::warn!(?kind, error = %e, "calendar access request failed");
            false
        }
    }
}

/// Events in `window`, one per `(id, start)`, ascending by start.
///
/// Recurring instances share an id but differ in start, so they survive.
pub async fn fetch_events(
    store: &dyn CalendarStore,
    window: TimeWindow,
    pending: &PendingQueries,
) -> Vec<Event> {
    pending.dispatch(1);
    let events = match pending.track(store.events_matching(window)).await {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(error = %e, "event query failed");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut events: Vec<Event> = events
        .into_iter()
        .filter(|e| seen.insert((e.id.clone(), e.start)))
        .collect();
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.title.cmp(&b.title)));
    events
}

/// Incomplete reminders.
pub async fn fetch_reminders(store: &dyn CalendarStore, pending: &PendingQueries) -> Vec<Reminder> {
    pending.dispatch(1);
    match pending.track(store.reminders()).await {
        Ok(reminders) => reminders.into_iter().filter(|r| !r.is_completed).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "reminder query failed");
            Vec::new()
        }
    }
}

/// Place each item into the bucket of its anchor's local day relative to
/// `now`. Unanchored items and items outside the three days are dropped.
pub fn classify<T: DayAnchored>(items: Vec<T>, now: &DateTime<FixedOffset>) -> DayBuckets<T> {
    let today = now.date_naive();
    let yesterday = today.pred_opt();
    let tomorrow = today.succ_opt();

    let mut buckets = DayBuckets::default();
    for item in items {
        let Some(anchor) = item.anchor() else {
            continue;
        };
        let day = local_day(anchor, now);
        let bucket = if day == today {
            Day::Today
        } else if Some(day) == yesterday {
            Day::Yesterday
        } else if Some(day) == tomorrow {
            Day::Tomorrow
        } else {
            continue;
        };
        buckets.get_mut(bucket).push(item);
    }
    buckets
}
