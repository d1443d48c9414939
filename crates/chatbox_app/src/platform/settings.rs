//! Environment-driven settings for the terminal app.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chatbox_engine::{ClientConfig, Coordinates, DeniedLocation, FixedLocation, LocationProvider};
use chatbox_logging::LogDestination;
use log::LevelFilter;

const STATE_FILE_VAR: &str = "CHATBOX_STATE_FILE";
const LOG_VAR: &str = "CHATBOX_LOG";
const LATITUDE_VAR: &str = "CHATBOX_LATITUDE";
const LONGITUDE_VAR: &str = "CHATBOX_LONGITUDE";
const FALLBACK_STATE_FILE: &str = "./.chatbox_state.ron";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub client: ClientConfig,
    pub state_file: PathBuf,
    pub log_destination: LogDestination,
    pub location: Option<Coordinates>,
}

impl AppSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let client = ClientConfig::from_env().context("agent runtime is not configured")?;
        Ok(Self::from_lookup(client, |key| std::env::var(key).ok()))
    }

    fn from_lookup(client: ClientConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let state_file = lookup(STATE_FILE_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_state_file);
        let log_destination = lookup(LOG_VAR)
            .and_then(|raw| LogDestination::parse(&raw))
            .unwrap_or(LogDestination::File);
        let location = parse_coordinates(
            lookup(LATITUDE_VAR).as_deref(),
            lookup(LONGITUDE_VAR).as_deref(),
        );
        Self {
            client,
            state_file,
            log_destination,
            location,
        }
    }

    pub fn locator(&self) -> Arc<dyn LocationProvider> {
        match self.location {
            Some(coordinates) => Arc::new(FixedLocation(coordinates)),
            None => Arc::new(DeniedLocation),
        }
    }
}

pub fn init_logging(settings: &AppSettings) {
    chatbox_logging::initialize(
        settings.log_destination,
        &chatbox_logging::default_log_path(),
        LevelFilter::Info,
    );
}

fn default_state_file() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("chatbox").join("state.ron"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_STATE_FILE))
}

fn parse_coordinates(latitude: Option<&str>, longitude: Option<&str>) -> Option<Coordinates> {
    let latitude: f64 = latitude?.trim().parse().ok()?;
    let longitude: f64 = longitude?.trim().parse().ok()?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some(Coordinates {
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> AppSettings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let client = ClientConfig::new("http://localhost:2024").unwrap();
        AppSettings::from_lookup(client, move |key| map.get(key).cloned())
    }

    #[test]
    fn explicit_state_file_and_log_destination_win() {
        let settings = settings(&[(STATE_FILE_VAR, "/tmp/chat.ron"), (LOG_VAR, "both")]);
        assert_eq!(settings.state_file, PathBuf::from("/tmp/chat.ron"));
        assert_eq!(settings.log_destination, LogDestination::Both);
    }

    #[test]
    fn defaults_log_to_file_without_location() {
        let settings = settings(&[]);
        assert_eq!(settings.log_destination, LogDestination::File);
        assert_eq!(settings.location, None);
        assert!(settings.state_file.ends_with("state.ron") || settings.state_file.ends_with(".chatbox_state.ron"));
    }

    #[test]
    fn coordinates_need_both_valid_values() {
        assert_eq!(
            parse_coordinates(Some("45.46"), Some(" 9.19 ")),
            Some(Coordinates {
                latitude: 45.46,
                longitude: 9.19
            })
        );
        assert_eq!(parse_coordinates(Some("45.46"), None), None);
        assert_eq!(parse_coordinates(Some("north"), Some("9")), None);
        assert_eq!(parse_coordinates(Some("91"), Some("9")), None);
    }
}
