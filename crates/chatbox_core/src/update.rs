use crate::{AppState, Effect, Message, Msg, ThreadId};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::InitializeSession],
        Msg::SessionLoaded { active, threads } => {
            state.set_thread_request_pending(false);
            state.set_threads(threads);
            if state.active_thread() == Some(&active) {
                Vec::new()
            } else {
                vec![subscribe(&mut state, active)]
            }
        }
        Msg::SessionFailed(error) => {
            state.set_thread_request_pending(false);
            state.set_error(error);
            Vec::new()
        }
        Msg::NewThreadRequested => {
            if state.is_loading() || state.is_thread_request_pending() {
                return (state, Vec::new());
            }
            state.set_thread_request_pending(true);
            vec![Effect::CreateThread]
        }
        Msg::ThreadSelected(thread_id) => {
            if !state.knows_thread(&thread_id) || state.active_thread() == Some(&thread_id) {
                return (state, Vec::new());
            }
            vec![
                Effect::SwitchThread(thread_id.clone()),
                subscribe(&mut state, thread_id),
            ]
        }
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::Submitted => {
            let text = state.input().trim().to_string();
            if text.is_empty() || !state.can_submit() {
                return (state, Vec::new());
            }
            state.set_input(String::new());
            submit(&mut state, Message::human(text))
        }
        Msg::StreamSnapshot {
            subscription,
            messages,
        } => {
            if subscription != state.subscription() {
                return (state, Vec::new());
            }
            state.apply_snapshot(messages);
            match state.take_location_request() {
                Some(subscription) => vec![Effect::RequestLocation { subscription }],
                None => Vec::new(),
            }
        }
        Msg::RunFinished { subscription } => {
            if subscription != state.subscription() {
                return (state, Vec::new());
            }
            state.finish_exchange();
            flush_pending_location(&mut state)
        }
        Msg::RunFailed {
            subscription,
            error,
        } => {
            if subscription != state.subscription() {
                return (state, Vec::new());
            }
            state.finish_exchange();
            state.set_error(error);
            flush_pending_location(&mut state)
        }
        Msg::HistoryFailed {
            subscription,
            error,
        } => {
            if subscription != state.subscription() {
                return (state, Vec::new());
            }
            state.set_error(error);
            Vec::new()
        }
        Msg::LocationAcquired {
            subscription,
            latitude,
            longitude,
        } => {
            if subscription != state.subscription() || state.active_thread().is_none() {
                return (state, Vec::new());
            }
            // The request usually arrives mid-run; hold the reply until the run ends.
            state.hold_location(latitude, longitude);
            if state.is_loading() {
                Vec::new()
            } else {
                flush_pending_location(&mut state)
            }
        }
        Msg::ToggleOpen => {
            state.toggle_open();
            Vec::new()
        }
        Msg::ToggleExpanded => {
            state.toggle_expanded();
            Vec::new()
        }
        Msg::LocationDenied { .. } | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn subscribe(state: &mut AppState, thread_id: ThreadId) -> Effect {
    let subscription = state.activate_thread(thread_id.clone());
    Effect::Subscribe {
        thread_id,
        subscription,
    }
}

fn submit(state: &mut AppState, message: Message) -> Vec<Effect> {
    let Some(thread_id) = state.active_thread().cloned() else {
        return Vec::new();
    };
    state.begin_exchange(message.clone());
    vec![Effect::SubmitRun {
        thread_id,
        subscription: state.subscription(),
        message,
    }]
}

fn flush_pending_location(state: &mut AppState) -> Vec<Effect> {
    match state.take_pending_location() {
        Some(message) => submit(state, message),
        None => Vec::new(),
    }
}
