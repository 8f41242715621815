use std::{collections::HashMap, fs, path::Path};

pub const SETTINGS_FILE: &str = "desktop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub username: String,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080/api".into(),
            username: "guest".into(),
            request_timeout_secs: 15,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then `desktop.toml` in the working directory, then environment.
///
/// An unparsable settings file is skipped; the second value describes it so the
/// caller can log it once tracing is up.
pub fn load_settings() -> (Settings, Option<String>) {
    let mut settings = Settings::default();
    let problem = apply_file(&mut settings, Path::new(SETTINGS_FILE))
        .err()
        .map(|err| format!("ignoring unparsable {SETTINGS_FILE}: {err}"));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    (settings, problem)
}

/// A missing file is not an error.
fn apply_file(settings: &mut Settings, path: &Path) -> Result<(), toml::de::Error> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Ok(());
    };
    apply_toml(settings, &raw)
}

fn apply_toml(settings: &mut Settings, raw: &str) -> Result<(), toml::de::Error> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)?;

    if let Some(v) = file_cfg.get("server_url").and_then(|v| v.as_str()) {
        settings.server_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("username").and_then(|v| v.as_str()) {
        settings.username = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(|v| v.as_integer())
    {
        if let Ok(secs) = u64::try_from(v) {
            settings.request_timeout_secs = secs;
        }
    }
    if let Some(v) = file_cfg.get("log_filter").and_then(|v| v.as_str()) {
        settings.log_filter = v.to_string();
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PARKING_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("PARKING_USERNAME") {
        settings.username = v;
    }
    if let Some(v) = var("APP__USERNAME") {
        settings.username = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}
