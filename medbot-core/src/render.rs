//! Transcript rendering
//!
//! Bot replies are trusted, pre-formatted text: newlines and `<br>` tags
//! become line breaks. User input is always one literal line. With
//! `sanitize_bot_markup` every tag is stripped from bot text before line
//! splitting, so only real newlines break lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::session::{Message, Sender, SessionState, TYPING_INDICATOR};

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\r?\n|<br\s*/?>").expect("valid line break pattern"));

static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("valid markup pattern"));

/// Rendering switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub sanitize_bot_markup: bool,
}

/// What a rendered line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    User,
    Bot,
    /// Ephemeral "typing" indicator, not a transcript entry
    Typing,
}

/// One visual line of the transcript view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub kind: LineKind,
    /// Index of the message this line belongs to; `None` for the indicator
    pub message: Option<usize>,
    pub text: String,
}

/// Split bot text into visual lines
pub fn render_bot_text(text: &str, options: RenderOptions) -> Vec<String> {
    if options.sanitize_bot_markup {
        let stripped = MARKUP_TAG.replace_all(text, "");
        stripped
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect()
    } else {
        LINE_BREAK.split(text).map(ToString::to_string).collect()
    }
}

/// Render user text as a single literal line
pub fn render_user_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.extend(c.escape_default()),
            c => out.push(c),
        }
    }
    out
}

/// Render one message into its visual lines
pub fn render_message(message: &Message, options: RenderOptions) -> Vec<String> {
    match message.sender() {
        Sender::Bot => render_bot_text(message.text(), options),
        Sender::User => vec![render_user_text(message.text())],
    }
}

/// Full transcript view, followed by the typing indicator while busy
pub fn transcript_view(state: &SessionState, options: RenderOptions) -> Vec<ViewLine> {
    let mut lines = Vec::new();
    for (index, message) in state.messages().iter().enumerate() {
        let kind = match message.sender() {
            Sender::User => LineKind::User,
            Sender::Bot => LineKind::Bot,
        };
        for text in render_message(message, options) {
            lines.push(ViewLine {
                kind,
                message: Some(index),
                text,
            });
        }
    }

    if state.is_busy() {
        lines.push(ViewLine {
            kind: LineKind::Typing,
            message: None,
            text: TYPING_INDICATOR.to_string(),
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GREETING;

    const FAITHFUL: RenderOptions = RenderOptions {
        sanitize_bot_markup: false,
    };
    const HARDENED: RenderOptions = RenderOptions {
        sanitize_bot_markup: true,
    };

    #[test]
    fn test_bot_newline_breaks_line_but_user_does_not() {
        assert_eq!(render_message(&Message::bot("Rest.\nDrink water."), FAITHFUL), vec![
            "Rest.",
            "Drink water."
        ]);
        assert_eq!(render_message(&Message::user("Rest.\nDrink water."), FAITHFUL), vec![
            "Rest.\\nDrink water."
        ]);
    }

    #[test]
    fn test_bot_br_tags_break_lines() {
        assert_eq!(render_bot_text("a<br>b<BR/>c<br />d\r\ne", FAITHFUL), vec![
            "a", "b", "c", "d", "e"
        ]);
        assert_eq!(render_user_text("a<br>b"), "a<br>b");
    }

    #[test]
    fn test_double_newline_keeps_blank_line() {
        assert_eq!(render_bot_text("question\n\ndisclaimer", FAITHFUL), vec![
            "question",
            "",
            "disclaimer"
        ]);
    }

    #[test]
    fn test_sanitized_bot_text_strips_markup() {
        assert_eq!(render_bot_text("<b>Rest</b><br>now\nplease", HARDENED), vec![
            "Restnow", "please"
        ]);
        assert_eq!(render_bot_text("temperature < 38 is fine", HARDENED), vec![
            "temperature < 38 is fine"
        ]);
    }

    #[test]
    fn test_user_control_chars_are_escaped() {
        assert_eq!(render_user_text("a\tb\r"), "a\\tb\\r");
        assert_eq!(render_user_text("plain text"), "plain text");
    }

    #[test]
    fn test_initial_view_is_greeting_only() {
        let state = SessionState::new();
        let view = transcript_view(&state, FAITHFUL);
        assert_eq!(view, vec![ViewLine {
            kind: LineKind::Bot,
            message: Some(0),
            text: GREETING.to_string(),
        }]);
    }

    #[test]
    fn test_typing_indicator_follows_last_message_while_busy() {
        let mut state = SessionState::new();
        state.set_user_id("u");
        state.set_input("hello");
        state.begin_submit().unwrap();

        let view = transcript_view(&state, FAITHFUL);
        assert_eq!(view.len(), 3);
        assert_eq!(view[1].kind, LineKind::User);
        assert_eq!(view[2].kind, LineKind::Typing);
        assert_eq!(view[2].text, TYPING_INDICATOR);
        assert_eq!(view[2].message, None);

        state.complete(Ok(crate::ChatReply::new("line one\nline two")));
        let view = transcript_view(&state, FAITHFUL);
        assert!(view.iter().all(|l| l.kind != LineKind::Typing));
        assert_eq!(view.len(), 4);
        assert_eq!(view[3].message, Some(2));
    }
}
