use chrono::NaiveDate;
use serde::Serialize;

pub const UPCOMING_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct IslamicEvent {
    pub name: &'static str,
    pub date: (i32, u32, u32),
    pub hijri_date: &'static str,
}

impl IslamicEvent {
    pub fn gregorian(&self) -> Option<NaiveDate> {
        let (y, m, d) = self.date;
        NaiveDate::from_ymd_opt(y, m, d)
    }
}

pub const IMPORTANT_DATES: [IslamicEvent; 11] = [
    IslamicEvent { name: "Mawlid an-Nabi", date: (2025, 9, 4), hijri_date: "12 Rabi al-Awwal 1447" },
    IslamicEvent { name: "Isra and Mi'raj", date: (2026, 1, 26), hijri_date: "27 Rajab 1447" },
    IslamicEvent { name: "Mid-Sha'ban (Shab-e-Barat)", date: (2026, 2, 13), hijri_date: "15 Sha'ban 1447" },
    IslamicEvent { name: "Ramadan Begins", date: (2026, 2, 28), hijri_date: "1 Ramadan 1447" },
    IslamicEvent { name: "Laylat al-Qadr", date: (2026, 3, 26), hijri_date: "27 Ramadan 1447" },
    IslamicEvent { name: "Eid al-Fitr", date: (2026, 3, 29), hijri_date: "1 Shawwal 1447" },
    IslamicEvent { name: "Day of Arafah", date: (2026, 6, 3), hijri_date: "9 Dhul Hijjah 1447" },
    IslamicEvent { name: "Eid al-Adha", date: (2026, 6, 4), hijri_date: "10 Dhul Hijjah 1447" },
    IslamicEvent { name: "Islamic New Year", date: (2026, 6, 25), hijri_date: "1 Muharram 1448" },
    IslamicEvent { name: "Day of Ashura", date: (2026, 7, 4), hijri_date: "10 Muharram 1448" },
    IslamicEvent { name: "Mawlid an-Nabi", date: (2026, 8, 23), hijri_date: "12 Rabi al-Awwal 1448" },
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventView {
    pub name: String,
    pub date: NaiveDate,
    pub hijri_date: String,
    pub days_until: i64,
    pub is_past: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub upcoming: Vec<EventView>,
    pub events: Vec<EventView>,
}

fn view(event: &IslamicEvent, today: NaiveDate) -> Option<EventView> {
    let date = event.gregorian()?;
    Some(EventView {
        name: event.name.to_string(),
        date,
        hijri_date: event.hijri_date.to_string(),
        days_until: (date - today).num_days(),
        is_past: date < today,
    })
}

/// Every known event, in date order, marked past or not relative to `today`.
pub fn all_events(today: NaiveDate) -> Vec<EventView> {
    IMPORTANT_DATES
        .iter()
        .filter_map(|event| view(event, today))
        .collect()
}

/// The next few events on or after `today`.
pub fn upcoming(today: NaiveDate, limit: usize) -> Vec<EventView> {
    all_events(today)
        .into_iter()
        .filter(|event| !event.is_past)
        .take(limit)
        .collect()
}

pub fn calendar_at(today: NaiveDate) -> CalendarResponse {
    CalendarResponse {
        upcoming: upcoming(today, UPCOMING_LIMIT),
        events: all_events(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upcoming_takes_next_three_including_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 26).unwrap();
        let events = upcoming(today, UPCOMING_LIMIT);
        let names: Vec<_> = events.iter().map(|event| event.name.as_str()).collect();
        assert_eq!(names, vec!["Laylat al-Qadr", "Eid al-Fitr", "Day of Arafah"]);
        assert_eq!(events[0].days_until, 0);
        assert_eq!(events[1].days_until, 3);
    }

    #[test]
    fn past_events_are_marked_but_listed() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 4).unwrap();
        let events = all_events(today);
        assert_eq!(events.len(), IMPORTANT_DATES.len());
        assert!(events.iter().filter(|event| event.is_past).count() == 7);
    }

    #[test]
    fn nothing_upcoming_after_the_list_ends() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert!(upcoming(today, UPCOMING_LIMIT).is_empty());
        assert_eq!(calendar_at(today).events.len(), IMPORTANT_DATES.len());
    }
}
