pub mod app;
pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod errors;
pub mod format;
pub mod geocode;
pub mod handlers;
pub mod hijri;
pub mod models;
pub mod reminders;
pub mod resolver;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::{bootstrap, AppState};
pub use storage::{load_preferences, persist_preferences};
