//! Calendar-day arithmetic and the clock seam.
//!
//! Every day boundary is computed in the offset of the reference "now", so a
//! fetch cycle classifies all of its items against one consistent local day.
//! Known limitation: when a DST change falls between yesterday and the day
//! after tomorrow, the neighbouring midnights are off by the DST delta. Days
//! are always exactly 24 hours apart here.

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, NaiveTime, Utc};

use crate::types::TimeWindow;

/// Source of the reference "now" for a fetch cycle.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Device wall clock in the local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock pinned to one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// The local calendar day of `ts` as seen from `reference`'s offset.
pub fn local_day(ts: DateTime<Utc>, reference: &DateTime<FixedOffset>) -> NaiveDate {
    ts.with_timezone(reference.offset()).date_naive()
}

/// Local midnight at the start of `day`, in `reference`'s offset. Days other
/// than `reference`'s own use that same offset even if DST differs on them.
pub fn start_of_day(day: NaiveDate, reference: &DateTime<FixedOffset>) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    // A fixed offset has exactly one mapping for every local time.
    (midnight - chrono::Duration::seconds(i64::from(reference.offset().local_minus_utc())))
        .and_utc()
}

/// Local midnight of `now`'s day through `now`.
pub fn today_so_far(now: &DateTime<FixedOffset>) -> TimeWindow {
    TimeWindow::new(start_of_day(now.date_naive(), now), now.to_utc())
}

/// The last `days` local days ending at `now` (the current partial day counts).
pub fn trailing_days(now: &DateTime<FixedOffset>, days: u32) -> TimeWindow {
    let first = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN);
    TimeWindow::new(start_of_day(first, now), now.to_utc())
}

/// Start of yesterday through the start of the day after tomorrow.
pub fn yesterday_through_tomorrow(now: &DateTime<FixedOffset>) -> TimeWindow {
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let after_tomorrow = today.checked_add_days(Days::new(2)).unwrap_or(today);
    TimeWindow::new(
        start_of_day(yesterday, now),
        start_of_day(after_tomorrow, now),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sydney_morning() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(10 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 5, 2, 8, 30, 0)
            .unwrap()
    }

    #[test]
    fn start_of_day_respects_offset() {
        let now = sydney_morning();
        let start = start_of_day(now.date_naive(), &now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 5, 1, 14, 0, 0).unwrap());
    }

    #[test]
    fn local_day_crosses_utc_midnight() {
        let now = sydney_morning();
        // 23:00 UTC on May 1st is 09:00 on May 2nd in UTC+10.
        let ts = Utc.with_ymd_and_hms(2025, 5, 1, 23, 0, 0).unwrap();
        assert_eq!(local_day(ts, &now), NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
    }

    #[test]
    fn today_window_starts_at_local_midnight() {
        let now = sydney_morning();
        let w = today_so_far(&now);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2025, 5, 1, 14, 0, 0).unwrap());
        assert_eq!(w.end, now.to_utc());
    }

    #[test]
    fn trailing_seven_days_include_today() {
        let now = sydney_morning();
        let w = trailing_days(&now, 7);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2025, 4, 25, 14, 0, 0).unwrap());
    }

    #[test]
    fn calendar_window_spans_three_days() {
        let now = sydney_morning();
        let w = yesterday_through_tomorrow(&now);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2025, 4, 30, 14, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2025, 5, 3, 14, 0, 0).unwrap());
    }

    #[test]
    fn calendar_window_keeps_now_offset_across_dst_change() {
        // Sydney moves to UTC+11 at 02:00 on October 5th; the window still
        // uses the UTC+10 offset of "now" for every midnight.
        let now = FixedOffset::east_opt(10 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 10, 4, 20, 0, 0)
            .unwrap();
        let w = yesterday_through_tomorrow(&now);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2025, 10, 2, 14, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2025, 10, 5, 14, 0, 0).unwrap());
        assert_eq!(w.end - w.start, chrono::Duration::hours(72));
    }
}
