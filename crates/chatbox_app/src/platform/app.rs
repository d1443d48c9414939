use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chatbox_core::{update, AppState, Msg};
use chatbox_engine::{EngineHandle, FileStore};
use chatbox_logging::{chat_error, chat_info};

use super::effects::EffectRunner;
use super::settings::AppSettings;
use super::ui::input::{parse_line, InputCommand};
use super::ui::render;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn run_app(settings: AppSettings) -> anyhow::Result<()> {
    chat_info!(
        "Starting chatbox against {} (state file {:?})",
        settings.client.api_url,
        settings.state_file
    );
    let store = FileStore::new(&settings.state_file);
    let engine = EngineHandle::new(settings.client.clone(), Box::new(store), settings.locator())
        .context("failed to start the chat engine")?;

    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let stdout = io::stdout();
    let clear = stdout.is_terminal();
    let mut app = ChatApp::new(EffectRunner::new(engine), stdout, clear);
    app.dispatch(Msg::Started);
    app.redraw();

    loop {
        for msg in app.runner.poll() {
            app.dispatch(msg);
        }
        match line_rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                if app.handle_line(&line) == Flow::Quit {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            // stdin closed
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    chat_info!("Chatbox closed");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct ChatApp<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    clear_screen: bool,
}

impl<W: Write> ChatApp<W> {
    fn new(runner: EffectRunner, out: W, clear_screen: bool) -> Self {
        Self {
            state: AppState::new(),
            runner,
            out,
            clear_screen,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        if was_dirty {
            self.redraw();
        }
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        match parse_line(line) {
            InputCommand::Message(text) => {
                if !self.state.view().is_open {
                    self.dispatch(Msg::ToggleOpen);
                }
                self.dispatch(Msg::InputChanged(text));
                self.dispatch(Msg::Submitted);
            }
            InputCommand::Toggle => self.dispatch(Msg::ToggleOpen),
            InputCommand::Expand => self.dispatch(Msg::ToggleExpanded),
            InputCommand::NewThread => self.dispatch(Msg::NewThreadRequested),
            InputCommand::Threads => {
                let lines = render::render_threads(&self.state.view());
                self.print(&lines);
            }
            InputCommand::Switch(selector) => match selector.resolve(self.state.threads()) {
                Some(thread_id) => self.dispatch(Msg::ThreadSelected(thread_id)),
                None => self.print(&["unknown thread; see /threads".to_string()]),
            },
            InputCommand::Help => self.print(&render::render_help()),
            InputCommand::Unknown(raw) => self.print(&[format!("unknown command {raw}; see /help")]),
            InputCommand::Quit => return Flow::Quit,
            InputCommand::Empty => {}
        }
        Flow::Continue
    }

    fn redraw(&mut self) {
        let lines = render::render(&self.state.view());
        if let Err(err) = self.write_frame(&lines) {
            chat_error!("Failed to draw chat view: {}", err);
        }
    }

    fn print(&mut self, lines: &[String]) {
        if let Err(err) = self.write_lines(lines, false) {
            chat_error!("Failed to write to terminal: {}", err);
        }
    }

    fn write_frame(&mut self, lines: &[String]) -> io::Result<()> {
        self.write_lines(lines, self.clear_screen)
    }

    /// One write per call; stdout is locked only for that write.
    fn write_lines(&mut self, lines: &[String], clear: bool) -> io::Result<()> {
        self.out.write_all(compose(lines, clear).as_bytes())?;
        self.out.flush()
    }
}

fn compose(lines: &[String], clear: bool) -> String {
    let mut frame = String::new();
    if clear {
        frame.push_str(CLEAR_SCREEN);
    }
    for line in lines {
        frame.push_str(line);
        frame.push('\n');
    }
    frame
}
