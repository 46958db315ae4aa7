use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::models::settings::Settings;

pub const API_URL_ENV: &str = "CHALLENGE_DASHBOARD_API_URL";
pub const TOKEN_ENV: &str = "CHALLENGE_DASHBOARD_TOKEN";

const CONFIG_FILE: &str = "config.toml";
const CACHE_FILE: &str = "cache.sqlite3";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ChallengeDashboard", "challenge-dashboard")
}

/// Reads and writes the dashboard's TOML configuration.
pub struct SettingsService {
    path: Option<PathBuf>,
}

impl SettingsService {
    /// Uses `path` when given, otherwise the per-user config location.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.or_else(Self::default_config_path),
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn default_cache_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.cache_dir().join(CACHE_FILE))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads the file (defaults when it does not exist) and applies
    /// environment overrides. Validation is left to the caller so command
    /// line flags can still fill gaps.
    pub fn load(&self) -> Result<Settings> {
        let mut settings = match &self.path {
            Some(path) if path.exists() => {
                let data = fs::read_to_string(path)
                    .with_context(|| format!("failed to read settings from {}", path.display()))?;
                toml::from_str(&data)
                    .with_context(|| format!("failed to parse settings from {}", path.display()))?
            }
            Some(path) => {
                log::info!("No settings file at {}; using defaults", path.display());
                Settings::default()
            }
            None => {
                log::warn!("Could not determine a settings location; using defaults");
                Settings::default()
            }
        };

        apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Writes `settings` to the configured path, creating parent directories.
    pub fn save(&self, settings: &Settings) -> Result<PathBuf> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| anyhow!("Could not determine where to write settings"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create dir {}", parent.display()))?;
        }

        let data = toml::to_string_pretty(settings).context("failed to serialize settings")?;
        fs::write(&path, data)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(path)
    }
}

/// Overrides the provider URL and token from the environment. Empty values are ignored.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(API_URL_ENV) {
        settings.provider.base_url = url;
    }

    if let Some(token) = non_empty(TOKEN_ENV) {
        settings.provider.token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = SettingsService::new(Some(temp_dir.path().join("absent.toml")));

        let settings = service.load().unwrap();
        assert_eq!(settings.display.tick_millis, 1000);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");
        let service = SettingsService::new(Some(path.clone()));

        let mut settings = Settings::default();
        settings.provider.base_url = "https://games.example.org/api".to_string();
        settings.cache.ttl_seconds = 45;
        settings.display.timezone = Some("Europe/Berlin".to_string());

        assert_eq!(service.save(&settings).unwrap(), path);

        let loaded = SettingsService::new(Some(path)).load().unwrap();
        assert_eq!(loaded.cache.ttl_seconds, 45);
        assert_eq!(loaded.display.timezone.as_deref(), Some("Europe/Berlin"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[provider\nbase_url = 1").unwrap();

        let err = SettingsService::new(Some(path)).load().unwrap_err();
        assert!(err.to_string().contains("failed to parse settings"));
    }

    #[test]
    fn test_env_overrides_skip_empty_values() {
        let vars: HashMap<&str, &str> = [(API_URL_ENV, "https://env.example.org"), (TOKEN_ENV, "  ")]
            .into_iter()
            .collect();

        let mut settings = Settings::default();
        settings.provider.token = Some("from-file".to_string());
        apply_env_overrides(&mut settings, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(settings.provider.base_url, "https://env.example.org");
        assert_eq!(settings.provider.token.as_deref(), Some("from-file"));
    }

    #[test]
    #[serial]
    fn test_load_reads_process_environment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = SettingsService::new(Some(temp_dir.path().join("config.toml")));

        std::env::set_var(TOKEN_ENV, "env-token");
        let settings = service.load();
        std::env::remove_var(TOKEN_ENV);

        assert_eq!(settings.unwrap().provider.token.as_deref(), Some("env-token"));
    }
}
