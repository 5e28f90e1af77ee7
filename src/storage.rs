use crate::errors::AppError;
use crate::models::Preferences;
use std::path::Path;
use tokio::fs;
use tracing::error;

pub async fn load_preferences(path: &Path) -> Preferences {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(prefs) => prefs,
            Err(err) => {
                error!("failed to parse preferences file: {err}");
                Preferences::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
        Err(err) => {
            error!("failed to read preferences file: {err}");
            Preferences::default()
        }
    }
}

pub async fn persist_preferences(path: &Path, prefs: &Preferences) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(prefs).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CalculationMethod, Madhab};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("prayer_prefs_{}_{name}", std::process::id()));
        path.push("preferences.json");
        path
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let prefs = load_preferences(&temp_path("missing")).await;
        assert_eq!(prefs, Preferences::default());
    }

    #[tokio::test]
    async fn persisted_preferences_load_back() {
        let path = temp_path("roundtrip");
        let prefs = Preferences {
            use_24h: true,
            reminders: true,
            method: CalculationMethod::Turkey,
            madhab: Madhab::Shafi,
        };
        persist_preferences(&path, &prefs).await.unwrap();
        assert_eq!(load_preferences(&path).await, prefs);
        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn malformed_file_yields_defaults() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"{not json").await.unwrap();
        assert_eq!(load_preferences(&path).await, Preferences::default());
        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
