//! Quiz core: definition and scoring plus the per-session state machine.
//!
//! The engine is stateless with respect to users: it takes a `Session`
//! snapshot and an answer and returns the next snapshot. Storage of
//! snapshots lives in `crate::session`.

pub mod catalog;
pub mod definition;
pub mod engine;
pub mod score;
pub mod state;

pub use catalog::bear_type_quiz;
pub use definition::{AnswerOption, CategoryDef, QuestionDef, QuizDefinition};
pub use engine::{Outcome, Prompt, QuizEngine};
pub use score::ScoreBoard;
pub use state::{QuizState, Session};
