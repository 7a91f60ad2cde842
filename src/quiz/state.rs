//! Quiz state machine: tracks which question a user is on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::score::ScoreBoard;

/// Position in the quiz.
///
/// Progresses linearly: AwaitingQuestion(0) → … → AwaitingQuestion(N).
/// `AwaitingQuestion(N)` means every question has been answered; the engine
/// classifies in the same call that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    AwaitingQuestion(usize),
}

impl QuizState {
    pub fn index(&self) -> usize {
        match self {
            Self::AwaitingQuestion(i) => *i,
        }
    }

    /// Whether this state is terminal for a quiz of `question_count` questions.
    pub fn is_terminal(&self, question_count: usize) -> bool {
        self.index() >= question_count
    }

    /// The following state, or `None` when already terminal.
    pub fn next(&self, question_count: usize) -> Option<QuizState> {
        if self.is_terminal(question_count) {
            None
        } else {
            Some(Self::AwaitingQuestion(self.index() + 1))
        }
    }
}

impl Default for QuizState {
    fn default() -> Self {
        Self::AwaitingQuestion(0)
    }
}

impl std::fmt::Display for QuizState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "awaiting_question({})", self.index())
    }
}

/// One user's quiz snapshot.
///
/// Snapshots are replaced wholesale on every accepted answer; nothing
/// mutates a stored session in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub state: QuizState,
    pub scores: ScoreBoard,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, scores: ScoreBoard) -> Self {
        Self {
            user_id: user_id.into(),
            state: QuizState::default(),
            scores,
            started_at: Utc::now(),
        }
    }

    pub fn current_question(&self) -> usize {
        self.state.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_to_terminal() {
        let mut state = QuizState::default();
        for expected in 1..=3 {
            state = state.next(3).unwrap();
            assert_eq!(state, QuizState::AwaitingQuestion(expected));
        }
        assert!(state.is_terminal(3));
        assert!(state.next(3).is_none());
    }

    #[test]
    fn is_terminal_only_at_end() {
        assert!(!QuizState::AwaitingQuestion(0).is_terminal(3));
        assert!(!QuizState::AwaitingQuestion(2).is_terminal(3));
        assert!(QuizState::AwaitingQuestion(3).is_terminal(3));
    }

    #[test]
    fn display_shows_index() {
        assert_eq!(
            QuizState::AwaitingQuestion(2).to_string(),
            "awaiting_question(2)"
        );
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = QuizState::AwaitingQuestion(1);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"awaiting_question":1}"#);
        let parsed: QuizState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn new_session_starts_at_zero() {
        let session = Session::new("42", ScoreBoard::new(["P", "A"]));
        assert_eq!(session.user_id, "42");
        assert_eq!(session.current_question(), 0);
        assert_eq!(session.scores.total(), 0);
        assert!(session.started_at <= Utc::now());
    }
}
