//! Service configuration from environment variables.

use std::{env, str::FromStr, time::Duration};

use tracing::warn;

use crate::{
    activity_queue::{DEFAULT_MAX_ACTIVITIES, DEFAULT_SYNC_DELAY},
    stream_source::DEFAULT_BASE_URL,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    /// Directory holding the JSON documents of the store.
    pub store_path: String,
    pub strava_base_url: String,
    pub strava_session_cookie: Option<String>,
    pub sync_delay: Duration,
    pub sync_max_activities: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            store_path: "./vam-data".to_string(),
            strava_base_url: DEFAULT_BASE_URL.to_string(),
            strava_session_cookie: None,
            sync_delay: DEFAULT_SYNC_DELAY,
            sync_max_activities: DEFAULT_MAX_ACTIVITIES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            store_path: lookup("STORE_PATH").unwrap_or(defaults.store_path),
            strava_base_url: lookup("STRAVA_BASE_URL").unwrap_or(defaults.strava_base_url),
            strava_session_cookie: lookup("STRAVA_SESSION_COOKIE").filter(|c| !c.is_empty()),
            sync_delay: Duration::from_millis(parse_or(
                &lookup,
                "SYNC_DELAY_MS",
                defaults.sync_delay.as_millis() as u64,
            )),
            sync_max_activities: parse_or(
                &lookup,
                "SYNC_MAX_ACTIVITIES",
                defaults.sync_max_activities,
            ),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {key}={raw}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<_, _> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]), AppConfig::default());
        assert_eq!(AppConfig::default().port, 3001);
        assert_eq!(AppConfig::default().sync_delay, Duration::from_millis(200));
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let cfg = config(&[
            ("PORT", "8080"),
            ("STORE_PATH", "/var/lib/vam"),
            ("STRAVA_SESSION_COOKIE", "_strava4_session=abc"),
            ("SYNC_DELAY_MS", "soon"),
            ("SYNC_MAX_ACTIVITIES", "25"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.store_path, "/var/lib/vam");
        assert_eq!(cfg.strava_session_cookie.as_deref(), Some("_strava4_session=abc"));
        assert_eq!(cfg.sync_delay, DEFAULT_SYNC_DELAY);
        assert_eq!(cfg.sync_max_activities, 25);
    }
}
