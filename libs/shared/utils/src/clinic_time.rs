use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// The clinic runs on a fixed UTC+1 clock. The deployment region does not
/// observe daylight saving, so no DST arithmetic is applied.
pub const CLINIC_UTC_OFFSET_HOURS: i32 = 1;

fn clinic_offset() -> FixedOffset {
    FixedOffset::east_opt(CLINIC_UTC_OFFSET_HOURS * 3600).unwrap()
}

/// Current instant shifted to the clinic timezone.
pub fn now_in_clinic_tz() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&clinic_offset())
}

/// Today's calendar date on the clinic clock.
pub fn today_in_clinic_tz() -> NaiveDate {
    now_in_clinic_tz().date_naive()
}

/// True iff the composed date-time is strictly earlier than `now`
/// (clinic-local wall time). An earlier calendar date is past regardless of
/// time, a later one never is; on the same date only the time decides.
pub fn is_past(date: NaiveDate, time: NaiveTime, now: NaiveDateTime) -> bool {
    date.and_time(time) < now
}

/// `is_past` against the current clinic-clock instant.
pub fn is_past_now(date: NaiveDate, time: NaiveTime) -> bool {
    is_past(date, time, now_in_clinic_tz().naive_local())
}
