use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

/// `h:mm a` for the 12-hour clock, `HH:mm` for the 24-hour clock, in `tz`.
pub fn format_time(time: DateTime<Utc>, tz: Tz, use_24h: bool) -> String {
    let local = time.with_timezone(&tz);
    if use_24h {
        local.format("%H:%M").to_string()
    } else {
        local.format("%-I:%M %p").to_string()
    }
}

/// `HH:MM:SS`, clamped at zero.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_both_clock_styles_in_local_zone() {
        let tz: Tz = "America/Toronto".parse().unwrap();
        let time = Utc.with_ymd_and_hms(2026, 1, 10, 17, 5, 0).unwrap();
        assert_eq!(format_time(time, tz, false), "12:05 PM");
        assert_eq!(format_time(time, tz, true), "12:05");

        let morning = Utc.with_ymd_and_hms(2026, 1, 10, 10, 7, 0).unwrap();
        assert_eq!(format_time(morning, tz, false), "5:07 AM");
        assert_eq!(format_time(morning, tz, true), "05:07");
    }

    #[test]
    fn countdown_pads_and_never_goes_negative() {
        assert_eq!(format_countdown(Duration::seconds(3 * 3600 + 4 * 60 + 5)), "03:04:05");
        assert_eq!(format_countdown(Duration::seconds(-10)), "00:00:00");
    }
}
