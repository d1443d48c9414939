use chatbox_core::{location_reply, update, AppState, Effect, Message, Msg, ThreadId};
use pretty_assertions::assert_eq;

fn loaded() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::SessionLoaded {
            active: ThreadId::from("t1"),
            threads: vec![ThreadId::from("t1"), ThreadId::from("t2")],
        },
    );
    state
}

fn location_request() -> Message {
    Message {
        requests_location: true,
        ..Message::assistant("Where are you?")
    }
}

#[test]
fn location_is_requested_once_per_marker_message() {
    let (state, effects) = update(
        loaded(),
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![Message::human("near me?"), location_request()],
        },
    );
    assert_eq!(effects, vec![Effect::RequestLocation { subscription: 1 }]);

    // The same tail delivered again does not ask twice.
    let (_state, effects) = update(
        state,
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![Message::human("near me?"), location_request()],
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn marker_not_on_last_message_is_ignored() {
    let (_state, effects) = update(
        loaded(),
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![location_request(), Message::assistant("never mind")],
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn granted_location_is_sent_hidden_when_idle() {
    let (state, _) = update(
        loaded(),
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![location_request()],
        },
    );
    let (state, effects) = update(
        state,
        Msg::LocationAcquired {
            subscription: 1,
            latitude: 45.46,
            longitude: 9.19,
        },
    );

    let hidden = Message::hidden_human(location_reply(45.46, 9.19));
    assert_eq!(
        effects,
        vec![Effect::SubmitRun {
            thread_id: ThreadId::from("t1"),
            subscription: 1,
            message: hidden.clone(),
        }]
    );
    assert!(state.is_loading());
    // Hidden messages keep their place in the list but never render.
    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.view().messages.len(), 1);
    assert_eq!(state.messages()[1], hidden);
}

#[test]
fn location_granted_mid_run_is_sent_after_run_ends() {
    let (state, _) = update(loaded(), Msg::InputChanged("shops near me".into()));
    let (state, _) = update(state, Msg::Submitted);
    let (state, effects) = update(
        state,
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![Message::human("shops near me"), location_request()],
        },
    );
    assert_eq!(effects, vec![Effect::RequestLocation { subscription: 1 }]);

    let (state, effects) = update(
        state,
        Msg::LocationAcquired {
            subscription: 1,
            latitude: 1.5,
            longitude: 2.5,
        },
    );
    assert!(effects.is_empty());

    let (_state, effects) = update(state, Msg::RunFinished { subscription: 1 });
    assert_eq!(
        effects,
        vec![Effect::SubmitRun {
            thread_id: ThreadId::from("t1"),
            subscription: 1,
            message: Message::hidden_human("Latitude: 1.5,Longitude: 2.5"),
        }]
    );
}

#[test]
fn denied_location_sends_nothing() {
    let (state, _) = update(
        loaded(),
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![location_request()],
        },
    );
    let (state, effects) = update(
        state,
        Msg::LocationDenied {
            subscription: 1,
            reason: "permission denied".into(),
        },
    );
    assert!(effects.is_empty());
    assert!(!state.is_loading());
    assert_eq!(state.messages().len(), 1);
}

#[test]
fn location_for_previous_thread_is_dropped_after_switch() {
    let (state, effects) = update(
        loaded(),
        Msg::StreamSnapshot {
            subscription: 1,
            messages: vec![location_request()],
        },
    );
    assert_eq!(effects, vec![Effect::RequestLocation { subscription: 1 }]);

    let (state, _) = update(state, Msg::ThreadSelected(ThreadId::from("t2")));
    assert_eq!(state.subscription(), 2);

    let (state, effects) = update(
        state,
        Msg::LocationAcquired {
            subscription: 1,
            latitude: 1.0,
            longitude: 2.0,
        },
    );
    assert!(effects.is_empty());
    assert!(!state.is_loading());
    assert!(state.messages().is_empty());

    // Nothing was held back for the new thread either.
    let (_state, effects) = update(state, Msg::RunFinished { subscription: 2 });
    assert!(effects.is_empty());
}
