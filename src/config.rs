use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const MIN_SEASON: i32 = 1999;
pub const MIN_WEEK: u32 = 1;
pub const MAX_WEEK: u32 = 22;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub season: i32,
    pub week: u32,
    pub history_limit: u32,
    pub request_timeout_secs: u64,
    pub demo_mode: bool,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            season: 2025,
            week: 10,
            history_limit: 100,
            request_timeout_secs: 10,
            demo_mode: false,
            export_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Reads `.env.local`, then `.env`, then the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_base = env::var("API_BASE_URL")
            .ok()
            .map(|val| normalize_base_url(&val))
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.api_base);
        let season = env::var("DEFAULT_SEASON")
            .ok()
            .and_then(|val| val.trim().parse::<i32>().ok())
            .unwrap_or(defaults.season)
            .max(MIN_SEASON);
        let week = env::var("DEFAULT_WEEK")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.week)
            .clamp(MIN_WEEK, MAX_WEEK);
        let history_limit = env::var("HISTORY_LIMIT")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.history_limit)
            .clamp(1, 1000);
        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_secs)
            .clamp(1, 120);
        let demo_mode = env::var("DEMO_MODE")
            .ok()
            .map(|val| parse_flag(&val))
            .unwrap_or(defaults.demo_mode);
        let export_dir = env::var("EXPORT_DIR")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);

        Self {
            api_base,
            season,
            week,
            history_limit,
            request_timeout_secs,
            demo_mode,
            export_dir,
        }
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
