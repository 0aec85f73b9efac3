use std::time::Duration;

use anyhow::{Context, Result};

use crate::loader::TransitionTimings;

#[derive(Debug, Clone)]
pub struct Config {
    // Site
    pub site_base_url: String,
    pub entry_path: String,
    pub lang_dir: String,

    // Local storage
    pub storage_path: String,

    // Transitions
    pub fade_out_ms: u64,
    pub settle_ms: u64,
    pub frame_ms: u64,

    /// Discard results of navigations and language switches that were
    /// overtaken by a newer one.
    pub guard_stale_results: bool,

    // HTTP
    pub http_timeout_secs: u64,

    // Widgets
    pub quote_api_url: String,
    pub weather_api_url: String,
    pub weather_api_key: Option<String>,
    pub weather_city: String,
    pub spotify_playlist_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Site
            site_base_url: std::env::var("SITE_BASE_URL").context("SITE_BASE_URL not set")?,
            entry_path: std::env::var("ENTRY_PATH").unwrap_or_else(|_| "/index.html".to_string()),
            lang_dir: std::env::var("LANG_DIR").unwrap_or_else(|_| "lang".to_string()),

            // Local storage
            storage_path: std::env::var("STORAGE_PATH")
                .unwrap_or_else(|_| ".folio-storage.json".to_string()),

            // Transitions
            fade_out_ms: parse_env("FADE_OUT_MS", 300),
            settle_ms: parse_env("SETTLE_MS", 700),
            frame_ms: parse_env("FRAME_MS", 16),
            guard_stale_results: parse_env("GUARD_STALE_RESULTS", true),

            // HTTP
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 10),

            // Widgets
            quote_api_url: std::env::var("QUOTE_API_URL")
                .unwrap_or_else(|_| "https://api.quotable.io/random?maxLength=150".to_string()),
            weather_api_url: std::env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5/weather".to_string()),
            weather_api_key: std::env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty()),
            weather_city: std::env::var("WEATHER_CITY").unwrap_or_else(|_| "Bern,CH".to_string()),
            spotify_playlist_id: std::env::var("SPOTIFY_PLAYLIST_ID")
                .unwrap_or_else(|_| "6m9PPqb4kF9Na8wGhqEjwd".to_string()),
        })
    }

    /// Configuration for a site at `base_url` with every optional value at
    /// its default.
    pub fn for_site(base_url: &str) -> Self {
        Self {
            site_base_url: base_url.to_string(),
            entry_path: "/index.html".to_string(),
            lang_dir: "lang".to_string(),
            storage_path: ".folio-storage.json".to_string(),
            fade_out_ms: 300,
            settle_ms: 700,
            frame_ms: 16,
            guard_stale_results: true,
            http_timeout_secs: 10,
            quote_api_url: "https://api.quotable.io/random?maxLength=150".to_string(),
            weather_api_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            weather_api_key: None,
            weather_city: "Bern,CH".to_string(),
            spotify_playlist_id: "6m9PPqb4kF9Na8wGhqEjwd".to_string(),
        }
    }

    pub fn transition_timings(&self) -> TransitionTimings {
        TransitionTimings {
            fade_out: Duration::from_millis(self.fade_out_ms),
            settle: Duration::from_millis(self.settle_ms),
            frame: Duration::from_millis(self.frame_ms),
        }
    }

    /// City label shown by the weather widget ("Bern,CH" → "Bern").
    pub fn weather_location_label(&self) -> &str {
        self.weather_city
            .split(',')
            .next()
            .unwrap_or(&self.weather_city)
            .trim()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SITE_BASE_URL",
        "ENTRY_PATH",
        "FADE_OUT_MS",
        "GUARD_STALE_RESULTS",
        "WEATHER_API_KEY",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_base_url() {
        clear_env();
        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SITE_BASE_URL"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("SITE_BASE_URL", "http://localhost:8000");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.site_base_url, "http://localhost:8000");
        assert_eq!(config.entry_path, "/index.html");
        assert_eq!(config.fade_out_ms, 300);
        assert_eq!(config.settle_ms, 700);
        assert!(config.guard_stale_results);
        assert!(config.weather_api_key.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_and_bad_numbers() {
        clear_env();
        std::env::set_var("SITE_BASE_URL", "http://localhost:8000");
        std::env::set_var("FADE_OUT_MS", "not-a-number");
        std::env::set_var("GUARD_STALE_RESULTS", "false");
        std::env::set_var("WEATHER_API_KEY", "");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.fade_out_ms, 300);
        assert!(!config.guard_stale_results);
        assert!(config.weather_api_key.is_none());

        clear_env();
    }

    #[test]
    fn test_transition_timings() {
        let timings = Config::for_site("http://localhost").transition_timings();
        assert_eq!(timings.fade_out, Duration::from_millis(300));
        assert_eq!(timings.settle, Duration::from_millis(700));
        assert_eq!(timings.frame, Duration::from_millis(16));
    }

    #[test]
    fn test_weather_location_label() {
        let mut config = Config::for_site("http://localhost");
        assert_eq!(config.weather_location_label(), "Bern");
        config.weather_city = "Zürich".to_string();
        assert_eq!(config.weather_location_label(), "Zürich");
    }
}
