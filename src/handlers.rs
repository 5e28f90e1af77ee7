use crate::calendar::{calendar_at, CalendarResponse};
use crate::engine::{CalculationMethod, Madhab};
use crate::errors::AppError;
use crate::format::format_time;
use crate::geocode::PlaceCandidate;
use crate::hijri::{hijri_response, HijriResponse};
use crate::models::{
    DashboardResponse, Location, LocationRequest, PrayerTimeView, QiblaResponse, SearchRequest,
    SettingsRequest,
};
use crate::reminders::Alert;
use crate::state::AppState;
use crate::storage::persist_preferences;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let now = Utc::now();
    let mut dashboard = state.dashboard.lock().await;
    dashboard.tick(now);
    Html(render_index(&dashboard.snapshot(now)))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct QiblaQuery {
    pub lat: f64,
    pub lon: f64,
}

pub async fn qibla(
    State(state): State<AppState>,
    Query(query): Query<QiblaQuery>,
) -> Result<Json<QiblaResponse>, AppError> {
    let location = Location::new(query.lat, query.lon, "UTC", None)?;
    let bearing = state.engine.qibla_bearing(location.lat(), location.lon())?;
    Ok(Json(QiblaResponse { bearing }))
}

#[derive(Debug, Deserialize)]
pub struct HijriQuery {
    pub timezone: Option<String>,
    pub date: Option<String>,
}

pub async fn hijri(Query(query): Query<HijriQuery>) -> Result<Json<HijriResponse>, AppError> {
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => {
            let name = query.timezone.as_deref().unwrap_or("UTC");
            let tz = name
                .parse::<Tz>()
                .map_err(|_| AppError::bad_request(format!("unknown time zone '{name}'")))?;
            Utc::now().with_timezone(&tz).date_naive()
        }
    };
    Ok(Json(hijri_response(date)?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PlaceCandidate>>, AppError> {
    Ok(Json(state.geocoder.search(&query.q).await?))
}

#[derive(Debug, Deserialize)]
pub struct PrayerTimesQuery {
    pub lat: f64,
    pub lon: f64,
    pub tz: Option<String>,
    pub date: Option<String>,
    pub method: Option<String>,
    pub madhab: Option<String>,
    #[serde(default)]
    pub use_24h: bool,
}

/// Stateless schedule lookup for arbitrary coordinates.
pub async fn prayer_times(
    State(state): State<AppState>,
    Query(query): Query<PrayerTimesQuery>,
) -> Result<Json<Vec<PrayerTimeView>>, AppError> {
    let tz = query.tz.as_deref().unwrap_or(state.config.default_tz.as_str());
    let location = Location::new(query.lat, query.lon, tz, None)?;
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().with_timezone(&location.tz()).date_naive(),
    };
    let method = match query.method.as_deref() {
        Some(raw) => raw.parse::<CalculationMethod>()?,
        None => CalculationMethod::NorthAmerica,
    };
    let madhab = match query.madhab.as_deref() {
        Some(raw) => raw.parse::<Madhab>()?,
        None => Madhab::Hanafi,
    };

    let schedule = state
        .engine
        .compute_schedule(&location, date, method, madhab)?;
    let views = schedule
        .entries()
        .iter()
        .map(|(name, time)| PrayerTimeView {
            name: *name,
            time: *time,
            formatted: format_time(*time, location.tz(), query.use_24h),
        })
        .collect();
    Ok(Json(views))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let now = Utc::now();
    let mut dashboard = state.dashboard.lock().await;
    dashboard.tick(now);
    Json(dashboard.snapshot(now))
}

/// Accepts a browser geolocation result. Anything unusable lands on the fallback.
pub async fn set_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationRequest>,
) -> Json<DashboardResponse> {
    let now = Utc::now();
    let tz = payload
        .tz
        .unwrap_or_else(|| state.config.default_tz.clone());
    let location = match (payload.lat, payload.lon) {
        (Some(lat), Some(lon)) => Location::new(lat, lon, &tz, payload.label)
            .map_err(|err| warn!("geolocation unusable: {err}"))
            .ok(),
        _ => {
            warn!("geolocation missing coordinates");
            None
        }
    }
    .unwrap_or_else(|| state.config.fallback_location(&tz));

    let mut dashboard = state.dashboard.lock().await;
    dashboard.set_location(location, now);
    Json(dashboard.snapshot(now))
}

/// Searches for a place and selects the first match, keeping the current zone.
pub async fn search_location(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<DashboardResponse>, AppError> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("query must not be empty"));
    }

    let candidates = state.geocoder.search(query).await?;
    let Some(first) = candidates.into_iter().next() else {
        return Err(AppError::not_found("No results"));
    };

    let now = Utc::now();
    let mut dashboard = state.dashboard.lock().await;
    let tz = dashboard.location().tz();
    let location = Location::new(first.lat, first.lon, tz.name(), Some(first.display_name))?;
    dashboard.set_location(location, now);
    Ok(Json(dashboard.snapshot(now)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsRequest>,
) -> Result<Json<DashboardResponse>, AppError> {
    let now = Utc::now();
    let mut dashboard = state.dashboard.lock().await;
    dashboard.apply(payload, now);
    persist_preferences(&state.prefs_path, dashboard.preferences()).await?;
    info!("settings updated: {:?}", dashboard.preferences());
    Ok(Json(dashboard.snapshot(now)))
}

pub async fn prayer_passed(State(state): State<AppState>) -> Json<DashboardResponse> {
    let now = Utc::now();
    let mut dashboard = state.dashboard.lock().await;
    dashboard.mark_prayer_passed(now);
    Json(dashboard.snapshot(now))
}

pub async fn calendar(State(state): State<AppState>) -> Json<CalendarResponse> {
    let dashboard = state.dashboard.lock().await;
    let today = Utc::now()
        .with_timezone(&dashboard.location().tz())
        .date_naive();
    Json(calendar_at(today))
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub since: u64,
}

pub async fn alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Json<Vec<Alert>> {
    let alerts = state
        .alerts
        .as_ref()
        .map(|feed| feed.since(query.since))
        .unwrap_or_default();
    Json(alerts)
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("date '{raw}' is not YYYY-MM-DD")))
}
