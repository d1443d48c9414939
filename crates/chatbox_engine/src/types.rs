use std::fmt;

use chrono::{DateTime, Utc};

use crate::location::Coordinates;
use crate::session::SessionSnapshot;

pub type SubscriptionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    Human,
    Assistant,
}

/// A thread message as delivered by the runtime, flattened to what the view needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub display: bool,
    pub is_link: bool,
    pub complete: bool,
    pub requests_location: bool,
}

/// A human message on its way upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub display: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub thread_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SessionLoaded(SessionSnapshot),
    SessionFailed(String),
    Snapshot {
        subscription: SubscriptionId,
        messages: Vec<ChatMessage>,
    },
    RunFinished {
        subscription: SubscriptionId,
    },
    RunFailed {
        subscription: SubscriptionId,
        error: String,
    },
    /// Opening a subscription could not load the thread's history.
    HistoryFailed {
        subscription: SubscriptionId,
        error: String,
    },
    LocationAcquired {
        subscription: SubscriptionId,
        coordinates: Coordinates,
    },
    LocationDenied {
        subscription: SubscriptionId,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidApiKey,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The response body did not have the expected shape.
    Decode,
    /// The runtime reported an error event mid-stream.
    Stream,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidApiKey => write!(f, "api key is not a valid header value"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Stream => write!(f, "run error"),
        }
    }
}
