use chatbox_core::{AppViewModel, MessageView};
use textwrap::Options;

use super::constants::*;

/// Full frame for the current view, one entry per terminal line.
pub fn render(view: &AppViewModel) -> Vec<String> {
    if !view.is_open {
        return vec![CLOSED_LABEL.to_string()];
    }

    let width = view.width();
    let mut lines = vec![header(view, width), rule(width)];

    for message in &view.messages {
        lines.extend(render_message(message, width));
        lines.push(String::new());
    }

    if view.is_loading {
        lines.push(TYPING_LABEL.to_string());
    }
    if let Some(status) = &view.status {
        lines.push(format!("! {status}"));
    }

    lines.push(rule(width));
    let prompt = if view.active_thread.is_none() {
        PROMPT_NO_THREAD
    } else if view.can_submit {
        PROMPT_READY
    } else {
        PROMPT_BUSY
    };
    lines.push(prompt.to_string());
    lines
}

/// Registry listing with 1-based positions; the active thread is starred.
pub fn render_threads(view: &AppViewModel) -> Vec<String> {
    if view.threads.is_empty() {
        return vec!["no threads yet".to_string()];
    }
    view.threads
        .iter()
        .enumerate()
        .map(|(index, thread)| {
            let marker = if view.active_thread.as_ref() == Some(thread) {
                '*'
            } else {
                ' '
            };
            format!("{marker} {:>2}) {thread}", index + 1)
        })
        .collect()
}

pub fn render_help() -> Vec<String> {
    HELP.iter().map(|line| line.to_string()).collect()
}

fn header(view: &AppViewModel, width: usize) -> String {
    let thread = match &view.active_thread {
        Some(thread) => {
            let position = view
                .threads
                .iter()
                .position(|known| known == thread)
                .map(|index| index + 1)
                .unwrap_or(1);
            format!("thread {thread} ({position}/{})", view.threads.len().max(1))
        }
        None => "no thread".to_string(),
    };
    let layout = if view.is_expanded { "[-]" } else { "[+]" };
    let left = format!("{TITLE} | {thread}");
    let padding = width.saturating_sub(left.chars().count() + layout.len());
    format!("{left}{}{layout}", " ".repeat(padding.max(1)))
}

fn rule(width: usize) -> String {
    "-".repeat(width)
}

fn render_message(message: &MessageView, width: usize) -> Vec<String> {
    match message {
        MessageView::RichText { html } => {
            let text = html_to_text(html);
            let indent = " ".repeat(ASSISTANT_MARKER.len() + 2);
            let initial = format!("{ASSISTANT_MARKER}: ");
            let options = Options::new(width)
                .initial_indent(&initial)
                .subsequent_indent(&indent);
            textwrap::wrap(&text, options)
                .into_iter()
                .map(|line| line.into_owned())
                .collect()
        }
        MessageView::Link { href } => {
            vec![format!("{ASSISTANT_MARKER}: -> {}", hyperlink(href))]
        }
        MessageView::HumanBubble { text } => {
            let bubble_width = (width * 3 / 4).max(HUMAN_MARKER.len() + 4);
            let initial = format!("{HUMAN_MARKER}: ");
            let indent = " ".repeat(HUMAN_MARKER.len() + 2);
            let options = Options::new(bubble_width)
                .initial_indent(&initial)
                .subsequent_indent(&indent);
            textwrap::wrap(text, options)
                .into_iter()
                .map(|line| format!("{line:>width$}"))
                .collect()
        }
    }
}

/// Assistant output is trusted HTML; flatten it to readable text.
fn html_to_text(html: &str) -> String {
    html2md::parse_html(html).trim().to_string()
}

/// OSC 8 terminal hyperlink whose visible label is the target itself.
fn hyperlink(href: &str) -> String {
    format!("\x1b]8;;{href}\x1b\\{href}\x1b]8;;\x1b\\")
}

#[cfg(test)]
mod tests {
    use chatbox_core::ThreadId;
    use pretty_assertions::assert_eq;

    use super::*;

    fn open_view(messages: Vec<MessageView>) -> AppViewModel {
        AppViewModel {
            is_open: true,
            can_submit: true,
            active_thread: Some(ThreadId::from("t1")),
            threads: vec![ThreadId::from("t1")],
            messages,
            ..AppViewModel::default()
        }
    }

    #[test]
    fn closed_widget_shows_only_the_toggle() {
        let view = AppViewModel::default();
        assert_eq!(render(&view), vec![CLOSED_LABEL.to_string()]);
    }

    #[test]
    fn link_renders_as_terminal_hyperlink_to_content() {
        let lines = render(&open_view(vec![MessageView::Link {
            href: "https://example.com/shop".into(),
        }]));
        assert!(lines
            .iter()
            .any(|line| line.contains("\x1b]8;;https://example.com/shop\x1b\\")));
    }

    #[test]
    fn rich_text_is_flattened_from_html() {
        let lines = render(&open_view(vec![MessageView::RichText {
            html: "<p>Ciao <b>Mario</b></p>".into(),
        }]));
        let body = lines.join("\n");
        assert!(body.contains("Mario"));
        assert!(!body.contains("<b>"));
    }

    #[test]
    fn human_bubbles_are_right_aligned_within_width() {
        let view = open_view(vec![MessageView::HumanBubble {
            text: "hello there".into(),
        }]);
        let lines = render(&view);
        let bubble = lines
            .iter()
            .find(|line| line.contains("hello there"))
            .expect("bubble line");
        assert_eq!(bubble.chars().count(), view.width());
        assert!(bubble.ends_with("you: hello there"));
    }

    #[test]
    fn expanded_layout_wraps_wider() {
        let long = "parola ".repeat(30);
        let mut view = open_view(vec![MessageView::RichText { html: long }]);
        let compact = render(&view);
        view.is_expanded = true;
        let expanded = render(&view);

        assert!(compact.len() > expanded.len());
        assert!(expanded
            .iter()
            .all(|line| line.chars().count() <= chatbox_core::EXPANDED_WIDTH));
    }

    #[test]
    fn loading_and_status_are_shown() {
        let mut view = open_view(Vec::new());
        view.is_loading = true;
        view.can_submit = false;
        view.status = Some("http status 500".into());
        let lines = render(&view);
        assert!(lines.contains(&TYPING_LABEL.to_string()));
        assert!(lines.contains(&"! http status 500".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some(PROMPT_BUSY));
    }

    #[test]
    fn thread_listing_marks_active() {
        let mut view = open_view(Vec::new());
        view.threads = vec![ThreadId::from("t2"), ThreadId::from("t1")];
        assert_eq!(
            render_threads(&view),
            vec!["   1) t2".to_string(), "*  2) t1".to_string()]
        );
    }
}
