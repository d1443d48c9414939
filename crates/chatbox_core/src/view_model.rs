use crate::{Message, Role, ThreadId};

/// Render width in columns for the compact layout.
pub const COLLAPSED_WIDTH: usize = 60;
/// Render width in columns for the expanded layout.
pub const EXPANDED_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub is_open: bool,
    pub is_expanded: bool,
    pub is_loading: bool,
    pub can_submit: bool,
    pub active_thread: Option<ThreadId>,
    pub threads: Vec<ThreadId>,
    pub messages: Vec<MessageView>,
    pub input: String,
    pub status: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn width(&self) -> usize {
        if self.is_expanded {
            EXPANDED_WIDTH
        } else {
            COLLAPSED_WIDTH
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageView {
    /// Assistant output rendered as trusted rich text.
    RichText { html: String },
    /// Assistant link, opened outside the widget.
    Link { href: String },
    /// Human message bubble.
    HumanBubble { text: String },
}

/// Maps a message to its rendered form; hidden messages yield `None`.
pub fn render_policy(message: &Message) -> Option<MessageView> {
    if !message.is_visible() {
        return None;
    }
    let view = match (message.role, message.is_link) {
        (Role::Assistant, true) => MessageView::Link {
            href: message.content.clone(),
        },
        (Role::Assistant, false) => MessageView::RichText {
            html: message.content.clone(),
        },
        (Role::Human, _) => MessageView::HumanBubble {
            text: message.content.clone(),
        },
    };
    Some(view)
}
