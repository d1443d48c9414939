use std::sync::Arc;

use thiserror::Error;

use chatbox_logging::{chat_info, chat_warn};

use crate::{AgentApi, ApiError, KeyValueStore, StoreError};

/// Storage key holding the active thread id.
pub const ACTIVE_THREAD_KEY: &str = "current-thread-id";
/// Storage key holding every known thread id, newest first, comma-joined.
pub const THREAD_REGISTRY_KEY: &str = "thread-ids";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("thread service failed: {0}")]
    Api(#[from] ApiError),
    #[error("session storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("unknown thread {0}")]
    UnknownThread(String),
}

/// Active thread plus the registry offered for switching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub active: String,
    pub threads: Vec<String>,
}

/// Owns the persisted active thread id and the registry of known threads.
pub struct SessionManager {
    store: Box<dyn KeyValueStore>,
    api: Arc<dyn AgentApi>,
}

impl SessionManager {
    pub fn new(store: Box<dyn KeyValueStore>, api: Arc<dyn AgentApi>) -> Self {
        Self { store, api }
    }

    /// Resolves the active thread, creating and persisting one if none is stored.
    pub async fn initialize(&mut self) -> Result<SessionSnapshot, SessionError> {
        if let Some(active) = self.read_active() {
            chat_info!("Resuming thread {}", active);
            let threads = self.known_threads(&active);
            return Ok(SessionSnapshot { active, threads });
        }

        let thread = self.api.create_thread().await?;
        let active = thread.thread_id;
        self.store.set(ACTIVE_THREAD_KEY, &active)?;
        self.store.set(THREAD_REGISTRY_KEY, &active)?;
        chat_info!("Started first thread {}", active);
        Ok(SessionSnapshot {
            threads: vec![active.clone()],
            active,
        })
    }

    /// Creates a remote thread, makes it active and prepends it to the registry.
    ///
    /// Storage is untouched when the remote call fails.
    pub async fn create_new_thread(&mut self) -> Result<SessionSnapshot, SessionError> {
        let thread = self.api.create_thread().await?;
        let active = thread.thread_id;

        let mut threads = match self.read_active() {
            Some(previous) => self.known_threads(&previous),
            None => self.read_registry(),
        };
        threads.retain(|id| id != &active);
        threads.insert(0, active.clone());
        self.store.set(ACTIVE_THREAD_KEY, &active)?;
        self.store.set(THREAD_REGISTRY_KEY, &threads.join(","))?;
        chat_info!("Switched to new thread {} ({} known)", active, threads.len());
        Ok(SessionSnapshot { active, threads })
    }

    /// Makes an already known thread active. No remote calls.
    pub fn switch_thread(&mut self, thread_id: &str) -> Result<SessionSnapshot, SessionError> {
        let threads = match self.read_active() {
            Some(active) => self.known_threads(&active),
            None => self.read_registry(),
        };
        if !threads.iter().any(|known| known == thread_id) {
            return Err(SessionError::UnknownThread(thread_id.to_string()));
        }
        self.store.set(ACTIVE_THREAD_KEY, thread_id)?;
        chat_info!("Switched to thread {}", thread_id);
        Ok(SessionSnapshot {
            active: thread_id.to_string(),
            threads,
        })
    }

    /// Current persisted session, if a thread was ever resolved.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let active = self.read_active()?;
        Some(SessionSnapshot {
            threads: self.known_threads(&active),
            active,
        })
    }

    fn read_active(&self) -> Option<String> {
        match self.store.get(ACTIVE_THREAD_KEY) {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                chat_warn!("Ignoring unreadable session state: {}", err);
                None
            }
        }
    }

    fn read_registry(&self) -> Vec<String> {
        match self.store.get(THREAD_REGISTRY_KEY) {
            Ok(Some(value)) => value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            Ok(None) => Vec::new(),
            Err(err) => {
                chat_warn!("Ignoring unreadable thread registry: {}", err);
                Vec::new()
            }
        }
    }

    /// Registry as stored, with the active id shown first if it is missing.
    fn known_threads(&self, active: &str) -> Vec<String> {
        let mut threads = self.read_registry();
        if !threads.iter().any(|id| id == active) {
            threads.insert(0, active.to_string());
        }
        threads
    }
}
