use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc as async_mpsc;

use chatbox_logging::{chat_debug, chat_info, chat_warn};

use crate::session::SessionManager;
use crate::subscription::{SubscriptionHandle, SubscriptionManager};
use crate::{
    AgentApi, ApiError, ChatMessage, ClientConfig, EngineEvent, KeyValueStore, LocationProvider,
    OutgoingMessage, ReqwestAgentClient, StreamSink, SubscriptionId,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    InitializeSession,
    CreateThread,
    SwitchThread {
        thread_id: String,
    },
    Subscribe {
        thread_id: String,
        subscription: SubscriptionId,
    },
    Submit {
        subscription: SubscriptionId,
        message: OutgoingMessage,
    },
    /// Ask the location provider on behalf of `subscription`.
    RequestLocation {
        subscription: SubscriptionId,
    },
}

/// Bridge between the synchronous UI loop and the async runtime thread.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

/// Session work, applied strictly in arrival order by a single worker task.
#[derive(Debug)]
enum SessionCommand {
    Initialize,
    CreateThread,
    Switch(String),
}

struct Services {
    api: Arc<dyn AgentApi>,
    session_tx: async_mpsc::UnboundedSender<SessionCommand>,
    locator: Arc<dyn LocationProvider>,
}

impl EngineHandle {
    pub fn new(
        config: ClientConfig,
        store: Box<dyn KeyValueStore>,
        locator: Arc<dyn LocationProvider>,
    ) -> Result<Self, EngineError> {
        let api: Arc<dyn AgentApi> = Arc::new(ReqwestAgentClient::new(config)?);
        Self::with_api(api, store, locator)
    }

    pub fn with_api(
        api: Arc<dyn AgentApi>,
        store: Box<dyn KeyValueStore>,
        locator: Arc<dyn LocationProvider>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let (session_tx, session_rx) = async_mpsc::unbounded_channel();
        runtime.spawn(run_session_worker(
            SessionManager::new(store, api.clone()),
            session_rx,
            event_tx.clone(),
        ));
        let services = Services {
            api,
            session_tx,
            locator,
        };

        thread::spawn(move || {
            let mut subscriptions = SubscriptionManager::new();
            while let Ok(command) = cmd_rx.recv() {
                dispatch(&runtime, &services, &mut subscriptions, command, &event_tx);
            }
            subscriptions.release();
            chat_debug!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn dispatch(
    runtime: &tokio::runtime::Runtime,
    services: &Services,
    subscriptions: &mut SubscriptionManager,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    let event_tx = event_tx.clone();
    match command {
        EngineCommand::InitializeSession => services.queue_session(SessionCommand::Initialize),
        EngineCommand::CreateThread => services.queue_session(SessionCommand::CreateThread),
        EngineCommand::SwitchThread { thread_id } => {
            services.queue_session(SessionCommand::Switch(thread_id))
        }
        EngineCommand::Subscribe {
            thread_id,
            subscription,
        } => {
            let handle = subscriptions.acquire(thread_id, subscription);
            runtime.spawn(load_history(services.api.clone(), handle, event_tx));
        }
        EngineCommand::Submit {
            subscription,
            message,
        } => match subscriptions.handle_for(subscription) {
            Some(handle) => {
                runtime.spawn(run_stream(services.api.clone(), handle, message, event_tx));
            }
            None => chat_debug!("Dropping submit for released subscription #{}", subscription),
        },
        EngineCommand::RequestLocation { subscription } => {
            let locator = services.locator.clone();
            runtime.spawn(async move {
                let event = match locator.current_position().await {
                    Ok(coordinates) => EngineEvent::LocationAcquired {
                        subscription,
                        coordinates,
                    },
                    Err(err) => EngineEvent::LocationDenied {
                        subscription,
                        reason: err.to_string(),
                    },
                };
                let _ = event_tx.send(event);
            });
        }
    }
}

impl Services {
    fn queue_session(&self, command: SessionCommand) {
        if let Err(err) = self.session_tx.send(command) {
            chat_warn!("Session worker stopped; dropping {:?}", err.0);
        }
    }
}

async fn run_session_worker(
    mut session: SessionManager,
    mut commands: async_mpsc::UnboundedReceiver<SessionCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    while let Some(command) = commands.recv().await {
        let result = match command {
            SessionCommand::Initialize => session.initialize().await,
            SessionCommand::CreateThread => session.create_new_thread().await,
            SessionCommand::Switch(thread_id) => session.switch_thread(&thread_id),
        };
        let _ = event_tx.send(session_event(result));
    }
    chat_debug!("Session worker finished");
}

fn session_event<E: std::fmt::Display>(
    result: Result<crate::SessionSnapshot, E>,
) -> EngineEvent {
    match result {
        Ok(snapshot) => EngineEvent::SessionLoaded(snapshot),
        Err(err) => {
            chat_warn!("Session operation failed: {}", err);
            EngineEvent::SessionFailed(err.to_string())
        }
    }
}

async fn load_history(
    api: Arc<dyn AgentApi>,
    handle: SubscriptionHandle,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let result = tokio::select! {
        _ = handle.released() => return,
        result = api.thread_messages(handle.thread_id()) => result,
    };
    if handle.is_released() || handle.has_streamed() {
        return;
    }
    let event = match result {
        Ok(messages) => {
            chat_info!(
                "Loaded {} messages for thread {}",
                messages.len(),
                handle.thread_id()
            );
            EngineEvent::Snapshot {
                subscription: handle.id(),
                messages,
            }
        }
        Err(err) => {
            chat_warn!("History load for thread {} failed: {}", handle.thread_id(), err);
            EngineEvent::HistoryFailed {
                subscription: handle.id(),
                error: err.to_string(),
            }
        }
    };
    let _ = event_tx.send(event);
}

async fn run_stream(
    api: Arc<dyn AgentApi>,
    handle: SubscriptionHandle,
    message: OutgoingMessage,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelStreamSink {
        handle: handle.clone(),
        tx: event_tx.clone(),
    };
    let messages = [message];
    let result = tokio::select! {
        _ = handle.released() => {
            chat_debug!("Stopped forwarding run for released subscription #{}", handle.id());
            return;
        }
        result = api.stream_run(handle.thread_id(), &messages, &sink) => result,
    };
    if handle.is_released() {
        return;
    }
    let event = match result {
        Ok(()) => EngineEvent::RunFinished {
            subscription: handle.id(),
        },
        Err(err) => {
            chat_warn!("Run on thread {} failed: {}", handle.thread_id(), err);
            EngineEvent::RunFailed {
                subscription: handle.id(),
                error: err.to_string(),
            }
        }
    };
    let _ = event_tx.send(event);
}

struct ChannelStreamSink {
    handle: SubscriptionHandle,
    tx: mpsc::Sender<EngineEvent>,
}

impl StreamSink for ChannelStreamSink {
    fn emit(&self, messages: Vec<ChatMessage>) {
        if self.handle.is_released() {
            return;
        }
        self.handle.mark_streamed();
        let _ = self.tx.send(EngineEvent::Snapshot {
            subscription: self.handle.id(),
            messages,
        });
    }
}
