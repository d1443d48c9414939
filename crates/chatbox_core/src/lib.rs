//! Chatbox core: pure conversation state machine and view-model helpers.
mod effect;
mod message;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use message::{location_reply, Message, Role, SubscriptionId, ThreadId};
pub use msg::Msg;
pub use state::AppState;
pub use update::update;
pub use view_model::{render_policy, AppViewModel, MessageView, COLLAPSED_WIDTH, EXPANDED_WIDTH};
