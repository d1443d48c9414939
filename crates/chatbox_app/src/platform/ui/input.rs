use chatbox_core::ThreadId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Message(String),
    Toggle,
    Expand,
    NewThread,
    Threads,
    Switch(ThreadSelector),
    Help,
    Quit,
    Unknown(String),
    Empty,
}

/// Registry entry chosen by 1-based position or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadSelector {
    Index(usize),
    Id(String),
}

impl ThreadSelector {
    pub fn resolve(&self, threads: &[ThreadId]) -> Option<ThreadId> {
        match self {
            ThreadSelector::Index(index) => index
                .checked_sub(1)
                .and_then(|i| threads.get(i))
                .cloned()
                // Purely numeric ids are still reachable by id.
                .or_else(|| find(threads, &index.to_string())),
            ThreadSelector::Id(id) => find(threads, id),
        }
    }
}

fn find(threads: &[ThreadId], id: &str) -> Option<ThreadId> {
    threads.iter().find(|thread| thread.as_str() == id).cloned()
}

pub fn parse_line(line: &str) -> InputCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputCommand::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return InputCommand::Message(trimmed.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "toggle" | "t" => InputCommand::Toggle,
        "expand" | "e" => InputCommand::Expand,
        "new" | "n" => InputCommand::NewThread,
        "threads" => InputCommand::Threads,
        "switch" | "s" if !arg.is_empty() => InputCommand::Switch(match arg.parse::<usize>() {
            Ok(index) => ThreadSelector::Index(index),
            Err(_) => ThreadSelector::Id(arg.to_string()),
        }),
        "help" | "h" | "?" => InputCommand::Help,
        "quit" | "q" | "exit" => InputCommand::Quit,
        _ => InputCommand::Unknown(trimmed.to_string()),
    }
}
