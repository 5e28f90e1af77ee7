use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::EventView;
use crate::config::FALLBACK_LOCATION;
use crate::engine::{CalculationMethod, Madhab};
use crate::reminders::ReminderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerName {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    /// Canonical display order.
    pub const ALL: [PrayerName; 6] = [
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Sunrise => "Sunrise",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }
}

impl fmt::Display for PrayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    Latitude(f64),
    Longitude(f64),
    TimeZone(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::Latitude(lat) => write!(f, "latitude {lat} is outside -90..90"),
            LocationError::Longitude(lon) => write!(f, "longitude {lon} is outside -180..180"),
            LocationError::TimeZone(tz) => write!(f, "unknown time zone '{tz}'"),
        }
    }
}

impl std::error::Error for LocationError {}

/// A place on earth plus the zone its prayer times are displayed in.
///
/// Never mutated; a new geolocation or search result replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    lat: f64,
    lon: f64,
    tz: Tz,
    label: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lon: f64, tz: &str, label: Option<String>) -> Result<Self, LocationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(LocationError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::Longitude(lon));
        }
        let tz = tz
            .parse::<Tz>()
            .map_err(|_| LocationError::TimeZone(tz.to_string()))?;
        Ok(Self { lat, lon, tz, label })
    }

    /// The named fallback place, shown in `tz`.
    pub fn fallback(tz: Tz) -> Self {
        Self {
            lat: FALLBACK_LOCATION.lat,
            lon: FALLBACK_LOCATION.lon,
            tz,
            label: Some(FALLBACK_LOCATION.label.to_string()),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// The six timestamps of one calendar day at one location, in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrayerSchedule {
    date: NaiveDate,
    entries: [(PrayerName, DateTime<Utc>); 6],
}

impl DailyPrayerSchedule {
    /// Times are given in canonical order: Fajr, Sunrise, Dhuhr, Asr, Maghrib, Isha.
    pub fn new(date: NaiveDate, times: [DateTime<Utc>; 6]) -> Self {
        let mut entries = [(PrayerName::Fajr, times[0]); 6];
        for (slot, (name, time)) in entries
            .iter_mut()
            .zip(PrayerName::ALL.into_iter().zip(times))
        {
            *slot = (name, time);
        }
        Self { date, entries }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entries(&self) -> &[(PrayerName, DateTime<Utc>); 6] {
        &self.entries
    }

    pub fn time(&self, prayer: PrayerName) -> DateTime<Utc> {
        self.entries[prayer as usize].1
    }

    /// Entries strictly later than `now`, in canonical order.
    pub fn remaining_after(
        &self,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = (PrayerName, DateTime<Utc>)> + '_ {
        self.entries
            .iter()
            .copied()
            .filter(move |(_, time)| *time > now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPrayer {
    pub name: PrayerName,
    pub time: DateTime<Utc>,
}

/// Preferences that survive restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub use_24h: bool,
    pub reminders: bool,
    pub method: CalculationMethod,
    pub madhab: Madhab,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            use_24h: false,
            reminders: false,
            method: CalculationMethod::NorthAmerica,
            madhab: Madhab::Hanafi,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tz: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    pub use_24h: Option<bool>,
    pub reminders: Option<bool>,
    pub method: Option<CalculationMethod>,
    pub madhab: Option<Madhab>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationView {
    pub lat: f64,
    pub lon: f64,
    pub tz: String,
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrayerTimeView {
    pub name: PrayerName,
    pub time: DateTime<Utc>,
    pub formatted: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextPrayerView {
    pub name: PrayerName,
    pub time: DateTime<Utc>,
    pub formatted: String,
    pub remaining_seconds: i64,
    pub countdown: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub location: LocationView,
    pub date: NaiveDate,
    pub preferences: Preferences,
    pub prayers: Option<Vec<PrayerTimeView>>,
    pub next_prayer: Option<NextPrayerView>,
    pub qibla: Option<f64>,
    pub hijri: String,
    pub upcoming_events: Vec<EventView>,
    pub reminders: ReminderStatus,
    pub passed_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QiblaResponse {
    pub bearing: f64,
}
