use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/qibla", get(handlers::qibla))
        .route("/api/hijri", get(handlers::hijri))
        .route("/api/search", get(handlers::search))
        .route("/api/prayer-times", get(handlers::prayer_times))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/location", post(handlers::set_location))
        .route("/api/location/search", post(handlers::search_location))
        .route("/api/settings", post(handlers::update_settings))
        .route("/api/prayer-passed", post(handlers::prayer_passed))
        .route("/api/calendar", get(handlers::calendar))
        .route("/api/alerts", get(handlers::alerts))
        .with_state(state)
}
