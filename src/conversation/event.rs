//! Inbound events: what a raw message means to the quiz.

/// The kinds of input the conversation reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    /// `/start`: begin (or restart) the quiz.
    Start,
    /// Any non-command text, treated as an answer.
    Answer(String),
    /// A slash command the quiz does not handle.
    Ignored,
}

/// Parses message content into a QuizEvent.
pub struct EventParser;

impl EventParser {
    pub fn parse(content: &str) -> QuizEvent {
        let trimmed = content.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return QuizEvent::Answer(trimmed.to_string());
        };

        // "/start", "/start@SomeBot", "/start payload"
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();

        if name.eq_ignore_ascii_case("start") {
            QuizEvent::Start
        } else {
            QuizEvent::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_variants() {
        for input in ["/start", " /start ", "/START", "/start@HoneyPathBot", "/start ref42"] {
            assert_eq!(EventParser::parse(input), QuizEvent::Start, "{input:?}");
        }
    }

    #[test]
    fn plain_text_is_answer() {
        assert_eq!(EventParser::parse(" a "), QuizEvent::Answer("a".into()));
        assert_eq!(
            EventParser::parse("I create a plan"),
            QuizEvent::Answer("I create a plan".into())
        );
    }

    #[test]
    fn other_commands_are_ignored() {
        assert_eq!(EventParser::parse("/help"), QuizEvent::Ignored);
        assert_eq!(EventParser::parse("/starting"), QuizEvent::Ignored);
        assert_eq!(EventParser::parse("/"), QuizEvent::Ignored);
    }
}
