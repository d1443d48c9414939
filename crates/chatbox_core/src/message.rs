use std::fmt;

/// Generation counter for stream subscriptions. Bumped on every thread change.
pub type SubscriptionId = u64;

/// Opaque identifier of a remote conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ThreadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Assistant,
}

/// One entry of a thread's message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    /// Text, trusted HTML, or a link target when `is_link` is set.
    pub content: String,
    /// Visibility hint. Only an explicit `false` hides a message.
    pub display: bool,
    pub is_link: bool,
    pub complete: bool,
    /// The assistant asked the client for its current position.
    pub requests_location: bool,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
            display: true,
            is_link: false,
            complete: true,
            requests_location: false,
        }
    }

    /// A human message that stays in stream order but is never rendered.
    pub fn hidden_human(content: impl Into<String>) -> Self {
        Self {
            display: false,
            ..Self::human(content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::human(content)
        }
    }

    pub fn assistant_link(href: impl Into<String>) -> Self {
        Self {
            is_link: true,
            ..Self::assistant(href)
        }
    }

    pub fn is_visible(&self) -> bool {
        !(self.role == Role::Human && !self.display)
    }
}

/// Body of the silent reply carrying the client's coordinates.
pub fn location_reply(latitude: f64, longitude: f64) -> String {
    format!("Latitude: {latitude},Longitude: {longitude}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicitly_hidden_human_messages_are_invisible() {
        assert!(Message::human("hi").is_visible());
        assert!(!Message::hidden_human("Latitude: 1,Longitude: 2").is_visible());

        let hidden_assistant = Message {
            display: false,
            ..Message::assistant("still shown")
        };
        assert!(hidden_assistant.is_visible());
    }

    #[test]
    fn location_reply_matches_wire_format() {
        assert_eq!(location_reply(45.5, 9.25), "Latitude: 45.5,Longitude: 9.25");
    }
}
