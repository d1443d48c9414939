use crate::view_model::{render_policy, AppViewModel};
use crate::{location_reply, Message, SubscriptionId, ThreadId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    active_thread: Option<ThreadId>,
    threads: Vec<ThreadId>,
    subscription: SubscriptionId,
    messages: Vec<Message>,
    input: String,
    is_open: bool,
    is_expanded: bool,
    is_loading: bool,
    pending_thread_request: bool,
    location_requested_at: Option<usize>,
    pending_location: Option<(f64, f64)>,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            is_open: self.is_open,
            is_expanded: self.is_expanded,
            is_loading: self.is_loading,
            can_submit: self.can_submit(),
            active_thread: self.active_thread.clone(),
            threads: self.threads.clone(),
            messages: self.messages.iter().filter_map(render_policy).collect(),
            input: self.input.clone(),
            status: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn active_thread(&self) -> Option<&ThreadId> {
        self.active_thread.as_ref()
    }

    pub fn threads(&self) -> &[ThreadId] {
        &self.threads
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_thread_request_pending(&self) -> bool {
        self.pending_thread_request
    }

    pub fn can_submit(&self) -> bool {
        self.active_thread.is_some() && !self.is_loading
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn set_threads(&mut self, threads: Vec<ThreadId>) {
        self.threads = threads;
        self.mark_dirty();
    }

    pub(crate) fn knows_thread(&self, thread_id: &ThreadId) -> bool {
        self.threads.contains(thread_id)
    }

    pub(crate) fn set_thread_request_pending(&mut self, pending: bool) {
        self.pending_thread_request = pending;
        self.mark_dirty();
    }

    /// Makes `thread_id` active and starts a new subscription generation.
    ///
    /// The accumulated message list belongs to the previous subscription and
    /// is dropped along with any in-flight exchange.
    pub(crate) fn activate_thread(&mut self, thread_id: ThreadId) -> SubscriptionId {
        self.active_thread = Some(thread_id);
        self.subscription += 1;
        self.messages.clear();
        self.is_loading = false;
        self.location_requested_at = None;
        self.pending_location = None;
        self.last_error = None;
        self.mark_dirty();
        self.subscription
    }

    /// Appends a human message and enters the awaiting-response state.
    pub(crate) fn begin_exchange(&mut self, message: Message) {
        self.messages.push(message);
        self.is_loading = true;
        self.last_error = None;
        self.mark_dirty();
    }

    pub(crate) fn apply_snapshot(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.mark_dirty();
    }

    pub(crate) fn finish_exchange(&mut self) {
        self.is_loading = false;
        self.mark_dirty();
    }

    pub(crate) fn set_error(&mut self, error: String) {
        self.last_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
        self.mark_dirty();
    }

    pub(crate) fn toggle_expanded(&mut self) {
        self.is_expanded = !self.is_expanded;
        self.mark_dirty();
    }

    /// The requesting subscription, once per message: when the last message
    /// asks for a location that was not requested yet.
    pub(crate) fn take_location_request(&mut self) -> Option<SubscriptionId> {
        let last = self.messages.len().checked_sub(1)?;
        if !self.messages[last].requests_location || self.location_requested_at == Some(last) {
            return None;
        }
        self.location_requested_at = Some(last);
        Some(self.subscription)
    }

    pub(crate) fn hold_location(&mut self, latitude: f64, longitude: f64) {
        self.pending_location = Some((latitude, longitude));
    }

    /// Turns held coordinates into the hidden reply message, if any.
    pub(crate) fn take_pending_location(&mut self) -> Option<Message> {
        self.pending_location
            .take()
            .map(|(latitude, longitude)| Message::hidden_human(location_reply(latitude, longitude)))
    }
}
