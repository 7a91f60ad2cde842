//! Conversation layer: message parsing and per-user ordered handling.

pub mod dispatcher;
pub mod event;
pub mod handler;

pub use dispatcher::Dispatcher;
pub use event::{EventParser, QuizEvent};
pub use handler::{ConversationHandler, STORAGE_RETRY_NOTICE};
