use crate::{Message, SubscriptionId, ThreadId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The widget was mounted; resolve the session.
    Started,
    /// Session manager reported the active thread and the registry (newest first).
    SessionLoaded {
        active: ThreadId,
        threads: Vec<ThreadId>,
    },
    /// Session initialization or thread creation failed upstream.
    SessionFailed(String),
    /// User asked for a fresh thread.
    NewThreadRequested,
    /// User picked a thread from the registry selector.
    ThreadSelected(ThreadId),
    /// User edited the message draft.
    InputChanged(String),
    /// User submitted the current draft.
    Submitted,
    /// The stream delivered the full message list for a subscription.
    StreamSnapshot {
        subscription: SubscriptionId,
        messages: Vec<Message>,
    },
    /// The in-flight run for a subscription ended.
    RunFinished { subscription: SubscriptionId },
    /// The in-flight run for a subscription failed.
    RunFailed {
        subscription: SubscriptionId,
        error: String,
    },
    /// Loading the thread's history for a subscription failed.
    HistoryFailed {
        subscription: SubscriptionId,
        error: String,
    },
    /// Location provider granted a position requested under `subscription`.
    LocationAcquired {
        subscription: SubscriptionId,
        latitude: f64,
        longitude: f64,
    },
    /// Location provider refused or failed.
    LocationDenied {
        subscription: SubscriptionId,
        reason: String,
    },
    /// Show or hide the chat panel.
    ToggleOpen,
    /// Switch between compact and wide layout.
    ToggleExpanded,
    NoOp,
}
