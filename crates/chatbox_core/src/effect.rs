use crate::{Message, SubscriptionId, ThreadId};

/// Work the shell must perform on behalf of `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Resolve the persisted active thread, creating one remotely if absent.
    InitializeSession,
    /// Request a fresh remote thread and make it active.
    CreateThread,
    /// Persist `ThreadId` as the active thread. No remote call.
    SwitchThread(ThreadId),
    /// Release the current stream subscription and open one for `thread_id`.
    Subscribe {
        thread_id: ThreadId,
        subscription: SubscriptionId,
    },
    /// Send one human message upstream and stream the run's output.
    SubmitRun {
        thread_id: ThreadId,
        subscription: SubscriptionId,
        message: Message,
    },
    /// Ask the location provider for the current position on behalf of `subscription`.
    RequestLocation { subscription: SubscriptionId },
}
