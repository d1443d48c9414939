use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const API_URL_VAR: &str = "CHATBOX_API_URL";
pub const API_KEY_VAR: &str = "CHATBOX_API_KEY";
pub const ASSISTANT_ID_VAR: &str = "CHATBOX_ASSISTANT_ID";

const DEFAULT_ASSISTANT_ID: &str = "chatbot";
const DEFAULT_MESSAGES_KEY: &str = "messages";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("invalid api url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Connection settings for the agent runtime.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the deployment, without a trailing slash.
    pub api_url: String,
    /// Sent as `x-api-key` when present.
    pub api_key: Option<String>,
    pub assistant_id: String,
    /// State key holding the message array in stream snapshots.
    pub messages_key: String,
    pub connect_timeout: Duration,
    /// Applies to thread creation and history loads. Streaming runs have no
    /// overall deadline.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(api_url.into())?;
        Ok(Self {
            api_url,
            api_key: None,
            assistant_id: DEFAULT_ASSISTANT_ID.to_string(),
            messages_key: DEFAULT_MESSAGES_KEY.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Reads the process environment, falling back to values baked in at build time.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| build_time_value(key).map(str::to_string))
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = non_empty(API_URL_VAR).ok_or(ConfigError::Missing(API_URL_VAR))?;
        let mut config = Self::new(api_url)?;
        config.api_key = non_empty(API_KEY_VAR);
        if let Some(assistant_id) = non_empty(ASSISTANT_ID_VAR) {
            config.assistant_id = assistant_id;
        }
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn build_time_value(key: &str) -> Option<&'static str> {
    match key {
        API_URL_VAR => option_env!("CHATBOX_API_URL"),
        API_KEY_VAR => option_env!("CHATBOX_API_KEY"),
        ASSISTANT_ID_VAR => option_env!("CHATBOX_ASSISTANT_ID"),
        _ => None,
    }
}

fn normalize_api_url(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/').to_string();
    let parsed = Url::parse(&trimmed).map_err(|err| ConfigError::InvalidUrl {
        url: raw.clone(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw,
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_url_key_and_assistant() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://agent.example.com/"),
            (API_KEY_VAR, "secret"),
            (ASSISTANT_ID_VAR, "support"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://agent.example.com");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.assistant_id, "support");
        assert_eq!(config.messages_key, "messages");
        assert_eq!(
            config.endpoint("/threads"),
            "https://agent.example.com/threads"
        );
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[(API_KEY_VAR, "secret")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(API_URL_VAR));

        let err = ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(API_URL_VAR));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            ClientConfig::new("ftp://agent.example.com"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "http://localhost:2024"),
            (API_KEY_VAR, ""),
        ]))
        .unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.assistant_id, "chatbot");
    }
}
