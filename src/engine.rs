use chrono::{NaiveDate, Utc};
use salah::prelude::{
    Configuration, Coordinates, Madhab as SalahMadhab, Method, Prayer, PrayerSchedule, Qiblah,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use crate::models::{DailyPrayerSchedule, Location, PrayerName};

/// Named presets of twilight angles, keyed by the authority that publishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMethod {
    #[serde(rename = "Muslim World League")]
    MuslimWorldLeague,
    #[serde(rename = "ISNA (North America)")]
    NorthAmerica,
    #[serde(rename = "Umm al-Qura (Makkah)")]
    UmmAlQura,
    #[serde(rename = "Egyptian General Authority")]
    Egyptian,
    Dubai,
    Kuwait,
    Qatar,
    Singapore,
    Tehran,
    Turkey,
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 10] = [
        CalculationMethod::MuslimWorldLeague,
        CalculationMethod::NorthAmerica,
        CalculationMethod::UmmAlQura,
        CalculationMethod::Egyptian,
        CalculationMethod::Dubai,
        CalculationMethod::Kuwait,
        CalculationMethod::Qatar,
        CalculationMethod::Singapore,
        CalculationMethod::Tehran,
        CalculationMethod::Turkey,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Muslim World League",
            CalculationMethod::NorthAmerica => "ISNA (North America)",
            CalculationMethod::UmmAlQura => "Umm al-Qura (Makkah)",
            CalculationMethod::Egyptian => "Egyptian General Authority",
            CalculationMethod::Dubai => "Dubai",
            CalculationMethod::Kuwait => "Kuwait",
            CalculationMethod::Qatar => "Qatar",
            CalculationMethod::Singapore => "Singapore",
            CalculationMethod::Tehran => "Tehran",
            CalculationMethod::Turkey => "Turkey",
        }
    }

    fn preset(self) -> Method {
        match self {
            CalculationMethod::MuslimWorldLeague => Method::MuslimWorldLeague,
            CalculationMethod::NorthAmerica => Method::NorthAmerica,
            CalculationMethod::UmmAlQura => Method::UmmAlQura,
            CalculationMethod::Egyptian => Method::Egyptian,
            CalculationMethod::Dubai => Method::Dubai,
            CalculationMethod::Kuwait => Method::Kuwait,
            CalculationMethod::Qatar => Method::Qatar,
            CalculationMethod::Singapore => Method::Singapore,
            CalculationMethod::Tehran => Method::Tehran,
            CalculationMethod::Turkey => Method::Turkey,
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CalculationMethod {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CalculationMethod::ALL
            .into_iter()
            .find(|method| method.label() == value.trim())
            .ok_or_else(|| EngineError::UnknownMethod(value.to_string()))
    }
}

/// Asr school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Madhab {
    Shafi,
    Hanafi,
}

impl Madhab {
    fn shadow_rule(self) -> SalahMadhab {
        match self {
            Madhab::Shafi => SalahMadhab::Shafi,
            Madhab::Hanafi => SalahMadhab::Hanafi,
        }
    }
}

impl FromStr for Madhab {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Shafi" => Ok(Madhab::Shafi),
            "Hanafi" => Ok(Madhab::Hanafi),
            other => Err(EngineError::UnknownMadhab(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Calculation(String),
    UnknownMethod(String),
    UnknownMadhab(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Calculation(reason) => write!(f, "prayer time calculation failed: {reason}"),
            EngineError::UnknownMethod(name) => write!(f, "unknown calculation method '{name}'"),
            EngineError::UnknownMadhab(name) => write!(f, "unknown madhab '{name}'"),
        }
    }
}

impl std::error::Error for EngineError {}

/// The astronomical collaborator. Treated as opaque and fallible.
pub trait PrayerEngine: Send + Sync {
    fn compute_schedule(
        &self,
        location: &Location,
        date: NaiveDate,
        method: CalculationMethod,
        madhab: Madhab,
    ) -> Result<DailyPrayerSchedule, EngineError>;

    /// Degrees clockwise from true north toward the Kaaba.
    fn qibla_bearing(&self, lat: f64, lon: f64) -> Result<f64, EngineError>;
}

/// Production engine backed by the `salah` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalahEngine;

impl PrayerEngine for SalahEngine {
    fn compute_schedule(
        &self,
        location: &Location,
        date: NaiveDate,
        method: CalculationMethod,
        madhab: Madhab,
    ) -> Result<DailyPrayerSchedule, EngineError> {
        // Presets come with the middle-of-the-night high-latitude rule.
        let params = Configuration::with(method.preset(), madhab.shadow_rule());
        let coordinates = Coordinates::new(location.lat(), location.lon());

        // salah panics when the sun never reaches a twilight angle (polar
        // summers), so that case is caught and reported as unavailable.
        let calculated = panic::catch_unwind(AssertUnwindSafe(|| {
            PrayerSchedule::new()
                .on(date)
                .for_location(coordinates)
                .with_configuration(params)
                .calculate()
        }))
        .map_err(|_| {
            EngineError::Calculation(format!(
                "twilight angle not reached at {:.4},{:.4} on {date}",
                location.lat(),
                location.lon()
            ))
        })?;
        let prayers = calculated.map_err(EngineError::Calculation)?;

        let times = PrayerName::ALL.map(|name| {
            let prayer = match name {
                PrayerName::Fajr => Prayer::Fajr,
                PrayerName::Sunrise => Prayer::Sunrise,
                PrayerName::Dhuhr => Prayer::Dhuhr,
                PrayerName::Asr => Prayer::Asr,
                PrayerName::Maghrib => Prayer::Maghrib,
                PrayerName::Isha => Prayer::Isha,
            };
            prayers.time(prayer).with_timezone(&Utc)
        });

        Ok(DailyPrayerSchedule::new(date, times))
    }

    fn qibla_bearing(&self, lat: f64, lon: f64) -> Result<f64, EngineError> {
        let bearing = Qiblah::new(Coordinates::new(lat, lon)).value();
        if bearing.is_finite() {
            Ok(bearing.rem_euclid(360.0))
        } else {
            Err(EngineError::Calculation(format!(
                "no qibla bearing for {lat},{lon}"
            )))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_labels_round_trip_through_from_str() {
        for method in CalculationMethod::ALL {
            assert_eq!(method.label().parse::<CalculationMethod>(), Ok(method));
        }
        assert!("Karachi".parse::<CalculationMethod>().is_err());
    }

    #[test]
    fn method_serializes_as_display_name() {
        let json = serde_json::to_string(&CalculationMethod::UmmAlQura).unwrap();
        assert_eq!(json, "\"Umm al-Qura (Makkah)\"");
        let method: CalculationMethod = serde_json::from_str("\"Dubai\"").unwrap();
        assert_eq!(method, CalculationMethod::Dubai);
    }

    #[test]
    fn madhab_parses_known_schools_only() {
        assert_eq!("Hanafi".parse::<Madhab>(), Ok(Madhab::Hanafi));
        assert_eq!("Shafi".parse::<Madhab>(), Ok(Madhab::Shafi));
        assert!("Maliki".parse::<Madhab>().is_err());
    }

    #[test]
    fn salah_schedule_is_ordered_for_toronto() {
        let location = Location::new(43.6532, -79.3832, "America/Toronto", None).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let schedule = SalahEngine
            .compute_schedule(&location, date, CalculationMethod::NorthAmerica, Madhab::Hanafi)
            .unwrap();

        let times: Vec<_> = schedule.entries().iter().map(|(_, time)| *time).collect();
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn salah_schedule_is_ordered_on_a_short_summer_night() {
        let location = Location::new(50.1109, 8.6821, "Europe/Berlin", None).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let schedule = SalahEngine
            .compute_schedule(&location, date, CalculationMethod::NorthAmerica, Madhab::Shafi)
            .unwrap();

        let times: Vec<_> = schedule.entries().iter().map(|(_, time)| *time).collect();
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]), "{times:?}");
    }

    #[test]
    fn salah_reports_polar_summer_as_unavailable() {
        let location = Location::new(69.6492, 18.9553, "Europe/Oslo", None).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let result = SalahEngine.compute_schedule(
            &location,
            date,
            CalculationMethod::MuslimWorldLeague,
            Madhab::Shafi,
        );

        assert!(matches!(result, Err(EngineError::Calculation(_))), "{result:?}");
    }

    #[test]
    fn salah_qibla_points_east_from_toronto() {
        let bearing = SalahEngine.qibla_bearing(43.6532, -79.3832).unwrap();
        assert!((50.0..60.0).contains(&bearing), "bearing was {bearing}");
    }
}
