// Settings service
// Loads dashboard configuration from config.toml and the environment

mod service;

pub use service::{apply_env_overrides, SettingsService, API_URL_ENV, TOKEN_ENV};
