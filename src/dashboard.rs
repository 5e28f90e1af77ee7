use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::calendar::{upcoming, UPCOMING_LIMIT};
use crate::engine::{CalculationMethod, Madhab, PrayerEngine};
use crate::format::{format_countdown, format_time};
use crate::hijri::HijriDate;
use crate::models::{
    DailyPrayerSchedule, DashboardResponse, Location, LocationView, NextPrayer, NextPrayerView,
    PrayerTimeView, Preferences, SettingsRequest,
};
use crate::reminders::{ReminderScheduler, ReminderStatus};
use crate::resolver::resolve_next;

/// Single owner of everything the dashboard shows.
///
/// Inputs change only through the setters below; each setter recomputes what
/// depends on it and re-arms reminders when they are on.
pub struct DashboardState {
    engine: Arc<dyn PrayerEngine>,
    location: Location,
    date: NaiveDate,
    /// Set when the user picked a date other than today; stops day rollover.
    date_pinned: bool,
    prefs: Preferences,
    schedule: Option<DailyPrayerSchedule>,
    qibla: Option<f64>,
    next: Option<NextPrayer>,
    passed_count: u64,
    reminders: ReminderScheduler,
    reminder_status: ReminderStatus,
}

impl DashboardState {
    pub fn new(
        engine: Arc<dyn PrayerEngine>,
        location: Location,
        prefs: Preferences,
        reminders: ReminderScheduler,
        now: DateTime<Utc>,
    ) -> Self {
        let date = now.with_timezone(&location.tz()).date_naive();
        let mut state = Self {
            engine,
            location,
            date,
            date_pinned: false,
            prefs,
            schedule: None,
            qibla: None,
            next: None,
            passed_count: 0,
            reminders,
            reminder_status: ReminderStatus::Off,
        };
        state.recompute(now);
        state
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn schedule(&self) -> Option<&DailyPrayerSchedule> {
        self.schedule.as_ref()
    }

    pub fn next_prayer(&self) -> Option<NextPrayer> {
        self.next
    }

    pub fn reminder_status(&self) -> ReminderStatus {
        self.reminder_status
    }

    pub fn pending_reminders(&self) -> usize {
        self.reminders.pending()
    }

    pub fn set_location(&mut self, location: Location, now: DateTime<Utc>) {
        info!(
            "location set to {:.4},{:.4} ({})",
            location.lat(),
            location.lon(),
            location.label().unwrap_or("unlabelled")
        );
        self.location = location;
        if !self.date_pinned {
            self.date = self.today(now);
        }
        self.recompute(now);
    }

    pub fn set_date(&mut self, date: NaiveDate, now: DateTime<Utc>) {
        if self.date != date {
            self.date = date;
            self.recompute(now);
        }
    }

    pub fn set_method(&mut self, method: CalculationMethod, now: DateTime<Utc>) {
        if self.prefs.method != method {
            self.prefs.method = method;
            self.recompute(now);
        }
    }

    pub fn set_madhab(&mut self, madhab: Madhab, now: DateTime<Utc>) {
        if self.prefs.madhab != madhab {
            self.prefs.madhab = madhab;
            self.recompute(now);
        }
    }

    pub fn set_use_24h(&mut self, use_24h: bool, now: DateTime<Utc>) {
        if self.prefs.use_24h != use_24h {
            self.prefs.use_24h = use_24h;
            self.rearm(now);
        }
    }

    pub fn set_reminders(&mut self, enabled: bool, now: DateTime<Utc>) -> ReminderStatus {
        self.prefs.reminders = enabled;
        self.rearm(now);
        self.reminder_status
    }

    /// Applies every field present in `request`, in a fixed order.
    pub fn apply(&mut self, request: SettingsRequest, now: DateTime<Utc>) {
        if let Some(date) = request.date {
            self.date_pinned = date != self.today(now);
            self.set_date(date, now);
        }
        if let Some(method) = request.method {
            self.set_method(method, now);
        }
        if let Some(madhab) = request.madhab {
            self.set_madhab(madhab, now);
        }
        if let Some(use_24h) = request.use_24h {
            self.set_use_24h(use_24h, now);
        }
        if let Some(enabled) = request.reminders {
            self.set_reminders(enabled, now);
        }
    }

    /// Called when the countdown reaches zero.
    pub fn mark_prayer_passed(&mut self, now: DateTime<Utc>) {
        self.passed_count += 1;
        self.resolve(now);
    }

    /// Follows the location's calendar day and re-resolves the next prayer if
    /// it is no longer in the future.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let today = self.today(now);
        if !self.date_pinned && today != self.date {
            info!("day rolled over to {today}");
            self.set_date(today, now);
            return true;
        }
        if self.next.is_some_and(|next| next.time <= now) {
            self.mark_prayer_passed(now);
            return true;
        }
        false
    }

    fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.location.tz()).date_naive()
    }

    fn compute(&self, date: NaiveDate) -> Option<DailyPrayerSchedule> {
        match self
            .engine
            .compute_schedule(&self.location, date, self.prefs.method, self.prefs.madhab)
        {
            Ok(schedule) => Some(schedule),
            Err(err) => {
                warn!("no prayer times for {date}: {err}");
                None
            }
        }
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        self.schedule = self.compute(self.date);
        self.qibla = self
            .engine
            .qibla_bearing(self.location.lat(), self.location.lon())
            .map_err(|err| warn!("no qibla bearing: {err}"))
            .ok();
        self.resolve(now);
        self.rearm(now);
    }

    fn resolve(&mut self, now: DateTime<Utc>) {
        let Some(schedule) = self.schedule.as_ref() else {
            self.next = None;
            return;
        };
        let engine = Arc::clone(&self.engine);
        let location = &self.location;
        let prefs = &self.prefs;
        self.next = resolve_next(schedule, now, location.tz(), |date| {
            engine.compute_schedule(location, date, prefs.method, prefs.madhab)
        })
        .map_err(|err| warn!("could not resolve next prayer: {err}"))
        .ok();
    }

    fn rearm(&mut self, now: DateTime<Utc>) {
        if !self.prefs.reminders {
            self.reminders.disarm();
            self.reminder_status = ReminderStatus::Off;
            return;
        }

        let Some(schedule) = self.schedule.as_ref() else {
            self.reminders.disarm();
            self.reminder_status = ReminderStatus::Armed { pending: 0 };
            return;
        };
        self.reminder_status =
            self.reminders
                .enable(schedule, self.location.tz(), now, self.prefs.use_24h);
        if self.reminder_status == ReminderStatus::ForcedOff {
            self.prefs.reminders = false;
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> DashboardResponse {
        let tz = self.location.tz();
        let use_24h = self.prefs.use_24h;

        let prayers = self.schedule.as_ref().map(|schedule| {
            schedule
                .entries()
                .iter()
                .map(|(name, time)| PrayerTimeView {
                    name: *name,
                    time: *time,
                    formatted: format_time(*time, tz, use_24h),
                })
                .collect()
        });

        let next_prayer = self.next.map(|next| {
            let remaining = next.time - now;
            NextPrayerView {
                name: next.name,
                time: next.time,
                formatted: format_time(next.time, tz, use_24h),
                remaining_seconds: remaining.num_seconds().max(0),
                countdown: format_countdown(remaining),
            }
        });

        let hijri = HijriDate::from_gregorian(self.date)
            .map(|date| date.formatted_en())
            .unwrap_or_default();

        DashboardResponse {
            location: LocationView {
                lat: self.location.lat(),
                lon: self.location.lon(),
                tz: tz.name().to_string(),
                label: self.location.label().map(str::to_string),
            },
            date: self.date,
            preferences: self.prefs.clone(),
            prayers,
            next_prayer,
            qibla: self.qibla,
            hijri,
            upcoming_events: upcoming(now.with_timezone(&tz).date_naive(), UPCOMING_LIMIT),
            reminders: self.reminder_status,
            passed_count: self.passed_count,
        }
    }
}
