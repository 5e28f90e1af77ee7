//! One-shot prayer reminders.
//!
//! The scheduler owns the only live set of timer tasks. Every `arm` starts by
//! disarming, and a task fires only while its generation is still current, so
//! once `disarm` returns no callback from the old set can reach the notifier.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ToneCue;
use crate::format::format_time;
use crate::models::{DailyPrayerSchedule, PrayerName};

const ALERT_HISTORY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReminderStatus {
    Off,
    Armed { pending: usize },
    /// Permission was denied; the caller must turn its reminder flag off.
    ForcedOff,
    /// The host has no notification facility.
    Unsupported,
}

/// What a fired timer reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub prayer: PrayerName,
    pub time: DateTime<Utc>,
    pub formatted: String,
}

impl Reminder {
    pub fn title(&self) -> String {
        self.prayer.to_string()
    }

    pub fn body(&self) -> String {
        format!("{} time: {}", self.prayer, self.formatted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToneError(pub String);

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tone playback failed: {}", self.0)
    }
}

impl std::error::Error for ToneError {}

pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;

    /// Asks the user once; the answer sticks.
    fn request_permission(&self) -> NotificationPermission;

    fn notify(&self, reminder: &Reminder);

    fn play_tone(&self, tone: &ToneCue) -> Result<(), ToneError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ReminderScheduler {
    notifier: Option<Arc<dyn Notifier>>,
    tone: ToneCue,
    generation: Arc<Mutex<u64>>,
    handles: Vec<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(notifier: Option<Arc<dyn Notifier>>, tone: ToneCue) -> Self {
        Self {
            notifier,
            tone,
            generation: Arc::new(Mutex::new(0)),
            handles: Vec::new(),
        }
    }

    /// Turns reminders on for `schedule`, settling notification permission first.
    pub fn enable(
        &mut self,
        schedule: &DailyPrayerSchedule,
        zone: Tz,
        now: DateTime<Utc>,
        use_24h: bool,
    ) -> ReminderStatus {
        self.disarm();
        let Some(notifier) = self.notifier.clone() else {
            debug!("notifications unsupported; reminders not armed");
            return ReminderStatus::Unsupported;
        };

        let permission = match notifier.permission() {
            NotificationPermission::Prompt => notifier.request_permission(),
            settled => settled,
        };
        if permission != NotificationPermission::Granted {
            warn!("notification permission {permission:?}; forcing reminders off");
            return ReminderStatus::ForcedOff;
        }

        let pending = self.arm(schedule, zone, now, use_24h);
        ReminderStatus::Armed { pending }
    }

    /// Replaces the live timer set with one timer per entry strictly after `now`.
    pub fn arm(
        &mut self,
        schedule: &DailyPrayerSchedule,
        zone: Tz,
        now: DateTime<Utc>,
        use_24h: bool,
    ) -> usize {
        self.disarm();
        let Some(notifier) = self.notifier.clone() else {
            return 0;
        };
        let generation = *lock(&self.generation);

        for (prayer, time) in schedule.remaining_after(now) {
            let delay = (time - now).to_std().unwrap_or_default();
            let reminder = Reminder {
                prayer,
                time,
                formatted: format_time(time, zone, use_24h),
            };
            let notifier = Arc::clone(&notifier);
            let current = Arc::clone(&self.generation);
            let tone = self.tone;

            self.handles.push(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                fire(&current, generation, notifier.as_ref(), &tone, &reminder);
            }));
        }

        info!(
            "armed {} prayer reminder(s) for {}",
            self.handles.len(),
            schedule.date()
        );
        self.handles.len()
    }

    pub fn disarm(&mut self) {
        *lock(&self.generation) += 1;
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// Timers armed and not yet fired.
    pub fn pending(&self) -> usize {
        self.handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn fire(
    current: &Mutex<u64>,
    generation: u64,
    notifier: &dyn Notifier,
    tone: &ToneCue,
    reminder: &Reminder,
) {
    // Held across the callback so a concurrent disarm waits for it to finish.
    let guard = lock(current);
    if *guard != generation {
        return;
    }
    info!("{}", reminder.body());
    notifier.notify(reminder);
    if let Err(err) = notifier.play_tone(tone) {
        debug!("{err}");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: u64,
    pub prayer: PrayerName,
    pub title: String,
    pub body: String,
    pub time: DateTime<Utc>,
    pub tone: Option<ToneCue>,
}

#[derive(Debug, Default)]
struct Feed {
    next_id: u64,
    alerts: VecDeque<Alert>,
}

/// Notifier that keeps recent alerts for the dashboard page to poll and show.
///
/// The page plays the attached tone cue itself.
pub struct AlertFeed {
    permission: Mutex<NotificationPermission>,
    feed: Mutex<Feed>,
}

impl AlertFeed {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission: Mutex::new(permission),
            feed: Mutex::new(Feed::default()),
        }
    }

    /// Alerts with an id greater than `since`, oldest first.
    pub fn since(&self, since: u64) -> Vec<Alert> {
        lock(&self.feed)
            .alerts
            .iter()
            .filter(|alert| alert.id > since)
            .cloned()
            .collect()
    }
}

impl Notifier for AlertFeed {
    fn permission(&self) -> NotificationPermission {
        *lock(&self.permission)
    }

    fn request_permission(&self) -> NotificationPermission {
        let mut permission = lock(&self.permission);
        if *permission == NotificationPermission::Prompt {
            *permission = NotificationPermission::Granted;
        }
        *permission
    }

    fn notify(&self, reminder: &Reminder) {
        let mut feed = lock(&self.feed);
        feed.next_id += 1;
        let alert = Alert {
            id: feed.next_id,
            prayer: reminder.prayer,
            title: reminder.title(),
            body: reminder.body(),
            time: reminder.time,
            tone: None,
        };
        feed.alerts.push_back(alert);
        while feed.alerts.len() > ALERT_HISTORY {
            feed.alerts.pop_front();
        }
    }

    fn play_tone(&self, tone: &ToneCue) -> Result<(), ToneError> {
        let mut feed = lock(&self.feed);
        let latest = feed
            .alerts
            .back_mut()
            .ok_or_else(|| ToneError("no alert to attach the tone to".into()))?;
        latest.tone = Some(*tone);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FixedEngine;
    use crate::engine::{CalculationMethod, Madhab, PrayerEngine};
    use crate::models::Location;
    use chrono::{NaiveDate, TimeZone};
    use std::time::Duration;

    fn toronto() -> Location {
        Location::new(43.6532, -79.3832, "America/Toronto", None).unwrap()
    }

    fn schedule(location: &Location) -> DailyPrayerSchedule {
        FixedEngine::standard()
            .compute_schedule(
                location,
                NaiveDate::from_ymd_opt(2026, 4, 14).unwrap(),
                CalculationMethod::NorthAmerica,
                Madhab::Hanafi,
            )
            .unwrap()
    }

    fn at(location: &Location, h: u32, m: u32) -> DateTime<Utc> {
        location
            .tz()
            .with_ymd_and_hms(2026, 4, 14, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn scheduler(permission: NotificationPermission) -> (ReminderScheduler, Arc<AlertFeed>) {
        let feed = Arc::new(AlertFeed::new(permission));
        let notifier: Arc<dyn Notifier> = feed.clone();
        (ReminderScheduler::new(Some(notifier), ToneCue::default()), feed)
    }

    #[tokio::test(start_paused = true)]
    async fn arms_one_timer_per_remaining_prayer() {
        let location = toronto();
        let (mut scheduler, _feed) = scheduler(NotificationPermission::Granted);

        let armed = scheduler.arm(&schedule(&location), location.tz(), at(&location, 12, 0), false);
        assert_eq!(armed, 4);
        assert_eq!(scheduler.pending(), 4);

        let armed = scheduler.arm(&schedule(&location), location.tz(), at(&location, 23, 0), false);
        assert_eq!(armed, 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fired_timer_raises_alert_with_tone() {
        let location = toronto();
        let (mut scheduler, feed) = scheduler(NotificationPermission::Granted);
        scheduler.arm(&schedule(&location), location.tz(), at(&location, 12, 0), false);

        // Dhuhr is at 12:15, Asr at 15:30.
        tokio::time::sleep(Duration::from_secs(20 * 60)).await;

        let alerts = feed.since(0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Dhuhr");
        assert_eq!(alerts[0].body, "Dhuhr time: 12:15 PM");
        assert_eq!(alerts[0].tone, Some(ToneCue::default()));
        assert_eq!(scheduler.pending(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn twenty_four_hour_format_in_alert_body() {
        let location = toronto();
        let (mut scheduler, feed) = scheduler(NotificationPermission::Granted);
        scheduler.arm(&schedule(&location), location.tz(), at(&location, 15, 0), true);

        tokio::time::sleep(Duration::from_secs(45 * 60)).await;

        let alerts = feed.since(0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].body, "Asr time: 15:30");
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_cancels_previous_generation() {
        let location = toronto();
        let (mut scheduler, feed) = scheduler(NotificationPermission::Granted);
        scheduler.arm(&schedule(&location), location.tz(), at(&location, 12, 0), false);

        // Same schedule, but "now" is past Maghrib: only Isha remains.
        let armed = scheduler.arm(&schedule(&location), location.tz(), at(&location, 18, 30), false);
        assert_eq!(armed, 1);

        // Long enough for every old timer (relative to 12:00) to have elapsed.
        tokio::time::sleep(Duration::from_secs(8 * 3600)).await;

        let alerts = feed.since(0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].prayer, PrayerName::Isha);
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_leaves_nothing_pending() {
        let location = toronto();
        let (mut scheduler, feed) = scheduler(NotificationPermission::Granted);
        scheduler.arm(&schedule(&location), location.tz(), at(&location, 4, 0), false);
        assert_eq!(scheduler.pending(), 6);

        scheduler.disarm();
        assert_eq!(scheduler.pending(), 0);

        tokio::time::sleep(Duration::from_secs(20 * 3600)).await;
        assert!(feed.since(0).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn denied_permission_forces_reminders_off() {
        let location = toronto();
        let (mut scheduler, _feed) = scheduler(NotificationPermission::Denied);

        let status = scheduler.enable(&schedule(&location), location.tz(), at(&location, 12, 0), false);
        assert_eq!(status, ReminderStatus::ForcedOff);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_permission_is_requested_then_armed() {
        let location = toronto();
        let (mut scheduler, feed) = scheduler(NotificationPermission::Prompt);

        let status = scheduler.enable(&schedule(&location), location.tz(), at(&location, 12, 0), false);
        assert_eq!(status, ReminderStatus::Armed { pending: 4 });
        assert_eq!(feed.permission(), NotificationPermission::Granted);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_notifier_is_a_no_op() {
        let location = toronto();
        let mut scheduler = ReminderScheduler::new(None, ToneCue::default());

        let status = scheduler.enable(&schedule(&location), location.tz(), at(&location, 12, 0), false);
        assert_eq!(status, ReminderStatus::Unsupported);
        assert_eq!(scheduler.pending(), 0);
    }

    struct Mute {
        inner: AlertFeed,
    }

    impl Notifier for Mute {
        fn permission(&self) -> NotificationPermission {
            self.inner.permission()
        }

        fn request_permission(&self) -> NotificationPermission {
            self.inner.request_permission()
        }

        fn notify(&self, reminder: &Reminder) {
            self.inner.notify(reminder)
        }

        fn play_tone(&self, _tone: &ToneCue) -> Result<(), ToneError> {
            Err(ToneError("no audio device".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tone_failure_does_not_block_alerts() {
        let location = toronto();
        let mute = Arc::new(Mute {
            inner: AlertFeed::new(NotificationPermission::Granted),
        });
        let notifier: Arc<dyn Notifier> = mute.clone();
        let mut scheduler = ReminderScheduler::new(Some(notifier), ToneCue::default());
        scheduler.arm(&schedule(&location), location.tz(), at(&location, 12, 0), false);

        tokio::time::sleep(Duration::from_secs(8 * 3600)).await;

        let alerts = mute.inner.since(0);
        let names: Vec<_> = alerts.iter().map(|alert| alert.prayer).collect();
        assert_eq!(
            names,
            vec![PrayerName::Dhuhr, PrayerName::Asr, PrayerName::Maghrib, PrayerName::Isha]
        );
        assert!(alerts.iter().all(|alert| alert.tone.is_none()));
    }

    #[test]
    fn feed_keeps_recent_history_only() {
        let feed = AlertFeed::new(NotificationPermission::Granted);
        let reminder = Reminder {
            prayer: PrayerName::Fajr,
            time: Utc.with_ymd_and_hms(2026, 4, 14, 9, 0, 0).unwrap(),
            formatted: "5:00 AM".into(),
        };
        for _ in 0..(ALERT_HISTORY + 5) {
            feed.notify(&reminder);
        }

        let alerts = feed.since(0);
        assert_eq!(alerts.len(), ALERT_HISTORY);
        assert_eq!(alerts[0].id, 6);
        assert_eq!(feed.since(alerts[ALERT_HISTORY - 1].id).len(), 0);
    }
}
