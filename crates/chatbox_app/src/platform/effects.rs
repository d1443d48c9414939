use chatbox_core::{Effect, Message, Msg, Role, ThreadId};
use chatbox_engine::{ChatMessage, ChatRole, EngineCommand, EngineEvent, EngineHandle, OutgoingMessage};
use chatbox_logging::{chat_info, chat_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.engine.send(map_effect(effect));
        }
    }

    /// Drains engine events that arrived since the last poll.
    pub fn poll(&self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            inbox.push(map_event(event));
        }
        inbox
    }
}

fn map_effect(effect: Effect) -> EngineCommand {
    match effect {
        Effect::InitializeSession => EngineCommand::InitializeSession,
        Effect::CreateThread => {
            chat_info!("CreateThread");
            EngineCommand::CreateThread
        }
        Effect::SwitchThread(thread_id) => {
            chat_info!("SwitchThread thread_id={}", thread_id);
            EngineCommand::SwitchThread {
                thread_id: thread_id.to_string(),
            }
        }
        Effect::Subscribe {
            thread_id,
            subscription,
        } => EngineCommand::Subscribe {
            thread_id: thread_id.to_string(),
            subscription,
        },
        Effect::SubmitRun {
            thread_id,
            subscription,
            message,
        } => {
            chat_info!(
                "SubmitRun thread_id={} subscription={} display={} len={}",
                thread_id,
                subscription,
                message.display,
                message.content.len()
            );
            EngineCommand::Submit {
                subscription,
                message: OutgoingMessage {
                    content: message.content,
                    display: message.display,
                },
            }
        }
        Effect::RequestLocation { subscription } => EngineCommand::RequestLocation { subscription },
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SessionLoaded(snapshot) => Msg::SessionLoaded {
            active: ThreadId::from(snapshot.active),
            threads: snapshot.threads.into_iter().map(ThreadId::from).collect(),
        },
        EngineEvent::SessionFailed(error) => Msg::SessionFailed(error),
        EngineEvent::Snapshot {
            subscription,
            messages,
        } => Msg::StreamSnapshot {
            subscription,
            messages: messages.into_iter().map(map_message).collect(),
        },
        EngineEvent::RunFinished { subscription } => Msg::RunFinished { subscription },
        EngineEvent::RunFailed {
            subscription,
            error,
        } => Msg::RunFailed {
            subscription,
            error,
        },
        EngineEvent::HistoryFailed {
            subscription,
            error,
        } => Msg::HistoryFailed {
            subscription,
            error,
        },
        EngineEvent::LocationAcquired {
            subscription,
            coordinates,
        } => Msg::LocationAcquired {
            subscription,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        },
        EngineEvent::LocationDenied {
            subscription,
            reason,
        } => {
            chat_warn!("Error getting location: {}", reason);
            Msg::LocationDenied {
                subscription,
                reason,
            }
        }
    }
}

fn map_message(message: ChatMessage) -> Message {
    Message {
        role: match message.role {
            ChatRole::Human => Role::Human,
            ChatRole::Assistant => Role::Assistant,
        },
        content: message.content,
        display: message.display,
        is_link: message.is_link,
        complete: message.complete,
        requests_location: message.requests_location,
    }
}
