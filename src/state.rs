use chrono::Utc;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{Config, NotificationMode};
use crate::dashboard::DashboardState;
use crate::engine::{PrayerEngine, SalahEngine};
use crate::geocode::{GeocodeError, Geocoder};
use crate::reminders::{AlertFeed, Notifier, ReminderScheduler};
use crate::storage::load_preferences;

#[derive(Clone)]
pub struct AppState {
    pub prefs_path: PathBuf,
    pub config: Arc<Config>,
    pub engine: Arc<dyn PrayerEngine>,
    pub geocoder: Geocoder,
    pub alerts: Option<Arc<AlertFeed>>,
    pub dashboard: Arc<Mutex<DashboardState>>,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: Arc<dyn PrayerEngine>,
        geocoder: Geocoder,
        alerts: Option<Arc<AlertFeed>>,
        dashboard: DashboardState,
    ) -> Self {
        Self {
            prefs_path: config.prefs_path.clone(),
            config: Arc::new(config),
            engine,
            geocoder,
            alerts,
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }
}

/// Wires the production engine, notifier and geocoder around `config`.
pub async fn bootstrap(config: Config) -> Result<AppState, GeocodeError> {
    let prefs = load_preferences(&config.prefs_path).await;
    let engine: Arc<dyn PrayerEngine> = Arc::new(SalahEngine);
    let geocoder = Geocoder::new(config.geocoder_url.clone())?;

    let alerts = match config.notifications {
        NotificationMode::Enabled(permission) => Some(Arc::new(AlertFeed::new(permission))),
        NotificationMode::Unsupported => None,
    };
    let notifier = alerts
        .as_ref()
        .map(|feed| Arc::clone(feed) as Arc<dyn Notifier>);
    let scheduler = ReminderScheduler::new(notifier, config.tone);

    let dashboard = DashboardState::new(
        Arc::clone(&engine),
        config.fallback_location(&config.default_tz),
        prefs,
        scheduler,
        Utc::now(),
    );
    info!(
        "dashboard ready: method {}, madhab {:?}, reminders {:?}",
        dashboard.preferences().method,
        dashboard.preferences().madhab,
        dashboard.reminder_status()
    );

    Ok(AppState::new(config, engine, geocoder, alerts, dashboard))
}
