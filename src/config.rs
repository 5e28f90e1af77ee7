use chrono_tz::Tz;
use serde::Serialize;
use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

use crate::models::Location;
use crate::reminders::NotificationPermission;

/// Where the dashboard lands when the browser cannot or will not say where it is.
pub struct FallbackLocation {
    pub lat: f64,
    pub lon: f64,
    pub label: &'static str,
}

pub const FALLBACK_LOCATION: FallbackLocation = FallbackLocation {
    lat: 43.6532,
    lon: -79.3832,
    label: "Toronto (fallback)",
};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PREFS_PATH: &str = "data/preferences.json";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_TZ: &str = "America/Toronto";

/// Reminder chime played when a prayer timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToneCue {
    pub frequency_hz: f64,
    pub gain: f64,
    pub duration_ms: u64,
}

impl Default for ToneCue {
    fn default() -> Self {
        Self {
            frequency_hz: 554.37,
            gain: 0.05,
            duration_ms: 1200,
        }
    }
}

/// Whether the host can show notifications at all, and with what permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMode {
    Unsupported,
    Enabled(NotificationPermission),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub prefs_path: PathBuf,
    pub geocoder_url: String,
    pub default_tz: String,
    pub notifications: NotificationMode,
    pub tone: ToneCue,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            default_tz: DEFAULT_TZ.to_string(),
            notifications: NotificationMode::Enabled(NotificationPermission::Granted),
            tone: ToneCue::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let default_tz = match env::var("PRAYER_DEFAULT_TZ") {
            Ok(tz) if tz.parse::<Tz>().is_ok() => tz,
            Ok(tz) => {
                warn!("ignoring unknown PRAYER_DEFAULT_TZ '{tz}'");
                defaults.default_tz
            }
            Err(_) => defaults.default_tz,
        };

        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),
            prefs_path: env::var("PRAYER_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prefs_path),
            geocoder_url: env::var("PRAYER_GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            default_tz,
            notifications: env::var("PRAYER_NOTIFICATIONS")
                .ok()
                .and_then(|value| parse_notifications(&value))
                .unwrap_or(defaults.notifications),
            tone: ToneCue {
                frequency_hz: parse_var("PRAYER_TONE_HZ").unwrap_or(defaults.tone.frequency_hz),
                gain: parse_var("PRAYER_TONE_GAIN").unwrap_or(defaults.tone.gain),
                duration_ms: parse_var("PRAYER_TONE_MS").unwrap_or(defaults.tone.duration_ms),
            },
        }
    }

    /// The named fallback, shown in `tz` when that names a zone and in the
    /// configured default zone otherwise.
    pub fn fallback_location(&self, tz: &str) -> Location {
        let zone = tz
            .parse::<Tz>()
            .or_else(|_| self.default_tz.parse::<Tz>())
            .unwrap_or(Tz::UTC);
        Location::fallback(zone)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring invalid {name}='{value}'");
            None
        }
    }
}

fn parse_notifications(value: &str) -> Option<NotificationMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "granted" => Some(NotificationMode::Enabled(NotificationPermission::Granted)),
        "denied" => Some(NotificationMode::Enabled(NotificationPermission::Denied)),
        "prompt" | "default" => Some(NotificationMode::Enabled(NotificationPermission::Prompt)),
        "off" | "unsupported" => Some(NotificationMode::Unsupported),
        other => {
            warn!("ignoring invalid PRAYER_NOTIFICATIONS='{other}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_defaults_match_chime() {
        let tone = ToneCue::default();
        assert_eq!(tone.frequency_hz, 554.37);
        assert_eq!(tone.gain, 0.05);
        assert_eq!(tone.duration_ms, 1200);
    }

    #[test]
    fn notification_modes_parse() {
        assert_eq!(
            parse_notifications("Denied"),
            Some(NotificationMode::Enabled(NotificationPermission::Denied))
        );
        assert_eq!(parse_notifications("off"), Some(NotificationMode::Unsupported));
        assert_eq!(parse_notifications("maybe"), None);
    }

    #[test]
    fn fallback_location_is_labelled_toronto() {
        let location = Config::default().fallback_location("America/Toronto");
        assert_eq!(location.label(), Some("Toronto (fallback)"));
        assert_eq!(location.lat(), FALLBACK_LOCATION.lat);
        assert_eq!(location.tz().name(), "America/Toronto");
    }

    #[test]
    fn fallback_location_keeps_a_valid_browser_zone() {
        let config = Config::default();
        assert_eq!(config.fallback_location("Asia/Riyadh").tz().name(), "Asia/Riyadh");
        assert_eq!(
            config.fallback_location("Mars/Olympus").tz().name(),
            "America/Toronto"
        );
    }
}
