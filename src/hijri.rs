//! Gregorian to Hijri conversion on the Umm al-Qura calendar.
//!
//! The published tables cover 1356-1500 AH (roughly 1937-2077 CE); dates
//! outside that range have no conversion.

use chrono::{Datelike, NaiveDate};
use hijri_date::HijriDate as UmmAlQura;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MONTHS_EN: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-awwal",
    "Rabi' al-thani",
    "Jumada al-awwal",
    "Jumada al-thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

pub const MONTHS_AR: [&str; 12] = [
    "محرم",
    "صفر",
    "ربيع الأول",
    "ربيع الآخر",
    "جمادى الأولى",
    "جمادى الآخرة",
    "رجب",
    "شعبان",
    "رمضان",
    "شوال",
    "ذو القعدة",
    "ذو الحجة",
];

#[derive(Debug, Clone, PartialEq)]
pub enum HijriError {
    OutOfRange { date: NaiveDate, reason: String },
}

impl fmt::Display for HijriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HijriError::OutOfRange { date, reason } => {
                write!(f, "no Umm al-Qura date for {date}: {reason}")
            }
        }
    }
}

impl std::error::Error for HijriError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HijriDate {
    pub year: i64,
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    pub fn from_gregorian(date: NaiveDate) -> Result<Self, HijriError> {
        let converted = UmmAlQura::from_gr(
            date.year() as usize,
            date.month() as usize,
            date.day() as usize,
        )
        .map_err(|reason| HijriError::OutOfRange {
            date,
            reason: reason.to_string(),
        })?;

        Ok(Self {
            year: converted.year() as i64,
            month: converted.month() as u32,
            day: converted.day() as u32,
        })
    }

    pub fn month_en(&self) -> &'static str {
        MONTHS_EN[self.month as usize - 1]
    }

    pub fn month_ar(&self) -> &'static str {
        MONTHS_AR[self.month as usize - 1]
    }

    pub fn formatted_en(&self) -> String {
        format!("{} {} {} AH", self.day, self.month_en(), self.year)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HijriPayload {
    pub day: u32,
    pub month: u32,
    pub month_en: String,
    pub month_ar: String,
    pub year: i64,
    pub formatted_en: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HijriResponse {
    pub gregorian: String,
    pub hijri: HijriPayload,
}

pub fn hijri_response(date: NaiveDate) -> Result<HijriResponse, HijriError> {
    let hijri = HijriDate::from_gregorian(date)?;
    Ok(HijriResponse {
        gregorian: date.to_string(),
        hijri: HijriPayload {
            day: hijri.day,
            month: hijri.month,
            month_en: hijri.month_en().to_string(),
            month_ar: hijri.month_ar().to_string(),
            year: hijri.year,
            formatted_en: hijri.formatted_en(),
        },
    })
}
