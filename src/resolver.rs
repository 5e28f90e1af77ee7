use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::engine::EngineError;
use crate::models::{DailyPrayerSchedule, NextPrayer, PrayerName};

/// Finds the soonest prayer strictly after `now`.
///
/// When every entry of `schedule` is at or before `now`, the schedule for the
/// calendar day after `now` (as seen in `zone`) is computed and its Fajr is
/// returned. Only that rollover computation can fail.
pub fn resolve_next<F>(
    schedule: &DailyPrayerSchedule,
    now: DateTime<Utc>,
    zone: Tz,
    compute_schedule: F,
) -> Result<NextPrayer, EngineError>
where
    F: FnOnce(NaiveDate) -> Result<DailyPrayerSchedule, EngineError>,
{
    if let Some((name, time)) = schedule.remaining_after(now).next() {
        return Ok(NextPrayer { name, time });
    }

    let today = now.with_timezone(&zone).date_naive();
    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| EngineError::Calculation(format!("no calendar day after {today}")))?;
    let next_day = compute_schedule(tomorrow)?;

    Ok(NextPrayer {
        name: PrayerName::Fajr,
        time: next_day.time(PrayerName::Fajr),
    })
}
