//! Chatbox engine: agent runtime client, session persistence and effect execution.
mod client;
mod config;
mod engine;
mod location;
mod session;
mod sse;
mod storage;
mod subscription;
mod types;
mod wire;

pub use client::{AgentApi, ReqwestAgentClient, StreamSink};
pub use config::{ClientConfig, ConfigError, API_KEY_VAR, API_URL_VAR, ASSISTANT_ID_VAR};
pub use engine::{EngineCommand, EngineError, EngineHandle};
pub use location::{Coordinates, DeniedLocation, FixedLocation, LocationError, LocationProvider};
pub use session::{
    SessionError, SessionManager, SessionSnapshot, ACTIVE_THREAD_KEY, THREAD_REGISTRY_KEY,
};
pub use sse::{SseDecoder, SseEvent};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use subscription::{StreamSubscription, SubscriptionHandle, SubscriptionManager};
pub use types::{
    ApiError, ChatMessage, ChatRole, EngineEvent, FailureKind, OutgoingMessage, SubscriptionId,
    ThreadInfo,
};
