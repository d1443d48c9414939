pub const TITLE: &str = "Chatbox";
pub const CLOSED_LABEL: &str = "[ chat ]  type /toggle to open";
pub const TYPING_LABEL: &str = "typing...";
pub const PROMPT_READY: &str = "Type your message... (/help for commands)";
pub const PROMPT_BUSY: &str = "Waiting for the reply...";
pub const PROMPT_NO_THREAD: &str = "No thread yet. Try /new";
pub const HUMAN_MARKER: &str = "you";
pub const ASSISTANT_MARKER: &str = "bot";

pub const HELP: &[&str] = &[
    "/toggle          show or hide the chat",
    "/expand          switch between compact and wide layout",
    "/new             start a new thread",
    "/threads         list known threads",
    "/switch <n|id>   switch to a known thread",
    "/quit            leave",
];
