//! Local notification reminders. Everything here is best effort: failures are
//! logged and reported as "not scheduled", never propagated.

use chrono::{NaiveTime, Timelike};
use uuid::Uuid;

use crate::store::{NotificationCenter, NotificationRequest, Trigger};

pub const DAILY_REMINDER_ID: &str = "daily_summary_notification";
pub const SUMMARY_READY_DELAY_SECS: u64 = 5;

async fn authorized(center: &dyn NotificationCenter) -> bool {
    match center.request_authorization().await {
        Ok(status) if status.allows_delivery() => true,
        Ok(status) => {
            tracing::info!(?status, "notifications not authorized");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "notification authorization failed");
            false
        }
    }
}

/// Replace the repeating daily reminder with one firing at `time` local.
/// Returns whether the reminder was scheduled.
pub async fn schedule_daily_reminder(center: &dyn NotificationCenter, time: NaiveTime) -> bool {
    if !authorized(center).await {
        return false;
    }

    center.remove_pending(&[DAILY_REMINDER_ID.to_string()]).await;
    let request = NotificationRequest {
        id: DAILY_REMINDER_ID.to_string(),
        title: "Athena".to_string(),
        body: "Remember to generate your daily summary!".to_string(),
        trigger: Trigger::Calendar {
            hour: time.hour(),
            minute: time.minute(),
            repeats: true,
        },
    };
    match center.schedule_local(request).await {
        Ok(()) => {
            tracing::info!(
                time = %time.format("%H:%M"),
                "scheduled daily summary reminder"
            );
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to schedule daily summary reminder");
            false
        }
    }
}

/// One-shot "summary ready" notification a few seconds from now. Returns the
/// request id when scheduled.
pub async fn notify_summary_ready(center: &dyn NotificationCenter) -> Option<String> {
    if !authorized(center).await {
        return None;
    }

    let id = Uuid::new_v4().to_string();
    let request = NotificationRequest {
        id: id.clone(),
        title: "Summary has been generated".to_string(),
        body: "Check it out in the app!".to_string(),
        trigger: Trigger::TimeInterval {
            seconds: SUMMARY_READY_DELAY_SECS,
            repeats: false,
        },
    };
    match center.schedule_local(request).await {
        Ok(()) => Some(id),
        Err(e) => {
            tracing::warn!(error = %e, "failed to send summary notification");
            None
        }
    }
}
