use chrono::Local;
use directories::ProjectDirs;
use facts_core::{report_file_name, write_report, Report, Settings};
use log::{info, warn};
use std::env;
use std::path::PathBuf;

const APP_NAME: &str = "math_facts";
const ORG_NAME: &str = "practice";
const SETTINGS_FILE: &str = "math-facts.json";
const FALLBACK_USERNAME: &str = "student";

fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", ORG_NAME, APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn current_username() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_USERNAME.to_string())
}

/// Per-user file first, then the shared one, then the platform config dir.
fn settings_candidates(username: &str) -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(format!("{}-{}", username, SETTINGS_FILE)),
        PathBuf::from(SETTINGS_FILE),
    ];
    if let Some(dir) = get_config_dir() {
        candidates.push(dir.join(SETTINGS_FILE));
    }
    candidates
}

pub fn load_settings() -> Result<Option<Settings>, String> {
    let username = current_username();
    let Some(path) = settings_candidates(&username)
        .into_iter()
        .find(|path| path.is_file())
    else {
        return Ok(None);
    };

    info!("reading settings from {}", path.display());
    Settings::load(&path)
        .map(Some)
        .map_err(|e| format!("Failed to load settings: {}", e))
}

pub fn load_settings_or_default() -> Settings {
    match load_settings() {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            info!("no settings file found, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!("{}, using defaults", e);
            Settings::default()
        }
    }
}

pub fn save_report(settings: &Settings, report: &Report<'_>) -> Result<PathBuf, String> {
    let file_name = report_file_name(&current_username(), Local::now().naive_local());
    write_report(&settings.reports_directory(), &file_name, &report.to_string())
        .map_err(|e| e.to_string())
}
