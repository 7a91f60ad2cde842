//! ConversationHandler: turns inbound messages into quiz steps and replies.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channels::{IncomingMessage, OutgoingResponse};
use crate::error::QuizError;
use crate::quiz::{Outcome, Prompt, QuizEngine, Session};
use crate::session::SessionStore;
use crate::store::{ClassificationRecord, ResultRecorder};

use super::event::{EventParser, QuizEvent};

/// Sent when the result could not be stored; the session is kept so the
/// next message retries.
pub const STORAGE_RETRY_NOTICE: &str =
    "⚠️ I couldn't save your result just now. Send any message to try again.";

/// Stateless glue between the gateway, the engine, the session store and
/// the result recorder.
pub struct ConversationHandler {
    engine: Arc<QuizEngine>,
    sessions: Arc<SessionStore>,
    recorder: Arc<dyn ResultRecorder>,
}

impl ConversationHandler {
    pub fn new(
        engine: Arc<QuizEngine>,
        sessions: Arc<SessionStore>,
        recorder: Arc<dyn ResultRecorder>,
    ) -> Self {
        Self {
            engine,
            sessions,
            recorder,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Process one message. `None` means nothing should be sent back.
    ///
    /// Callers must not run two `handle` calls for the same user at once.
    pub async fn handle(&self, msg: &IncomingMessage) -> Option<OutgoingResponse> {
        match EventParser::parse(&msg.content) {
            QuizEvent::Start => {
                let (_, prompt) = self.sessions.restart(&msg.user_id).await;
                info!(
                    user_id = %msg.user_id,
                    user_name = msg.user_name.as_deref().unwrap_or("-"),
                    channel = %msg.channel,
                    "Quiz started"
                );
                Some(prompt_response(prompt))
            }
            QuizEvent::Answer(text) => Some(self.handle_answer(&msg.user_id, &text).await),
            QuizEvent::Ignored => {
                debug!(user_id = %msg.user_id, content = %msg.content, "Ignoring command");
                None
            }
        }
    }

    async fn handle_answer(&self, user_id: &str, text: &str) -> OutgoingResponse {
        let session = self.sessions.get_or_create(user_id).await;

        // Completed on an earlier message but the result was not stored.
        if self.engine.is_complete(&session) {
            info!(user_id = %user_id, "Retrying result storage");
            return self.finalize(session).await;
        }

        let index = session.current_question();
        let Some(code) = self.engine.match_option(index, text) else {
            debug!(user_id = %user_id, question = index, answer = %text, "Unrecognized answer");
            return self.reprompt(&session);
        };

        match self.engine.submit(&session, code) {
            Ok((next, Outcome::NextPrompt(prompt))) => {
                self.sessions.advance(user_id, next).await;
                prompt_response(prompt)
            }
            Ok((next, Outcome::Complete(category))) => {
                info!(user_id = %user_id, category = %category, scores = %next.scores, "Quiz complete");
                self.sessions.advance(user_id, next.clone()).await;
                self.finalize(next).await
            }
            Err(e @ QuizError::InvalidAnswer { .. }) => {
                debug!(user_id = %user_id, error = %e, "Answer rejected");
                self.reprompt(&session)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Answer could not be applied");
                self.reprompt(&session)
            }
        }
    }

    /// Store the classification of a completed session; drop the session
    /// only once the row is durable.
    async fn finalize(&self, session: Session) -> OutgoingResponse {
        let Some(category) = self.engine.classify(&session) else {
            return self.reprompt(&session);
        };

        let record = ClassificationRecord::now(&session.user_id, &category);
        if let Err(e) = self.recorder.record(&record).await {
            error!(
                user_id = %session.user_id,
                category = %category,
                recorder = self.recorder.name(),
                error = %e,
                "Failed to record classification; keeping session for retry"
            );
            return OutgoingResponse::text(STORAGE_RETRY_NOTICE);
        }

        self.sessions.remove(&session.user_id).await;
        info!(user_id = %session.user_id, category = %category, "Classification recorded");

        let plan = self.engine.plan_for(&category).unwrap_or_default();
        OutgoingResponse::text(format!("🎯 Your type: **{category}**\n{plan}"))
    }

    /// Resend the prompt the session is waiting on.
    fn reprompt(&self, session: &Session) -> OutgoingResponse {
        match self.engine.current_prompt(session) {
            Some(prompt) => prompt_response(prompt),
            None => OutgoingResponse::text(STORAGE_RETRY_NOTICE),
        }
    }
}

fn prompt_response(prompt: Prompt) -> OutgoingResponse {
    OutgoingResponse::text(prompt.text).with_options(prompt.options)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::Timelike;
    use tokio::sync::Mutex;

    use super::*;
    use crate::error::StorageError;
    use crate::quiz::bear_type_quiz;
    use crate::quiz::catalog::{APPROVAL_SEEKER, CHRONIC_PLANNER};
    use crate::store::SheetRow;

    /// In-memory recorder that can be switched into a failing state.
    #[derive(Default)]
    struct MemoryRecorder {
        rows: Mutex<Vec<SheetRow>>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ResultRecorder for MemoryRecorder {
        fn name(&self) -> &str {
            "memory"
        }

        async fn ensure_schema(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn record(&self, record: &ClassificationRecord) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk on fire".into()));
            }
            self.rows.lock().await.push(record.to_row());
            Ok(())
        }

        async fn rows(&self) -> Result<Vec<SheetRow>, StorageError> {
            Ok(self.rows.lock().await.clone())
        }
    }

    fn setup() -> (ConversationHandler, Arc<MemoryRecorder>) {
        let engine = Arc::new(QuizEngine::new(bear_type_quiz()).unwrap());
        let sessions = Arc::new(SessionStore::new(Arc::clone(&engine)));
        let recorder = Arc::new(MemoryRecorder::default());
        let handler = ConversationHandler::new(engine, sessions, recorder.clone());
        (handler, recorder)
    }

    async fn say(handler: &ConversationHandler, user: &str, text: &str) -> Option<OutgoingResponse> {
        handler
            .handle(&IncomingMessage::new("test", user, text))
            .await
    }

    #[tokio::test]
    async fn start_sends_first_question_with_options() {
        let (handler, _) = setup();
        let reply = say(&handler, "u1", "/start").await.unwrap();
        assert!(reply.content.contains("1. How do you usually start"));
        assert_eq!(reply.options, vec!["A", "B", "C"]);
        assert_eq!(handler.sessions().len().await, 1);
    }

    #[tokio::test]
    async fn full_quiz_records_once_and_removes_session() {
        let (handler, recorder) = setup();
        say(&handler, "u1", "/start").await;
        let q2 = say(&handler, "u1", "a").await.unwrap();
        assert!(q2.content.starts_with("2. "));
        let q3 = say(&handler, "u1", "A").await.unwrap();
        assert!(q3.content.starts_with("3. "));
        let result = say(&handler, "u1", " a ").await.unwrap();

        assert!(result.content.contains(&format!("**{CHRONIC_PLANNER}**")));
        assert!(result.content.contains("Take action WITHOUT preparation."));
        assert!(result.options.is_empty());

        let rows = recorder.rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "u1");
        assert_eq!(rows[0].category, CHRONIC_PLANNER);
        assert!(handler.sessions().get("u1").await.is_none());
    }

    #[tokio::test]
    async fn invalid_answer_resends_same_prompt() {
        let (handler, _) = setup();
        say(&handler, "u1", "/start").await;
        let q2 = say(&handler, "u1", "B").await.unwrap();
        let before = handler.sessions().get("u1").await.unwrap();

        let again = say(&handler, "u1", "maybe").await.unwrap();
        assert_eq!(again, q2);
        assert_eq!(handler.sessions().get("u1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn first_message_without_start_creates_session() {
        let (handler, _) = setup();
        let reply = say(&handler, "u1", "hello").await.unwrap();
        assert!(reply.content.contains("1. How do you usually start"));
        let session = handler.sessions().get("u1").await.unwrap();
        assert_eq!(session.current_question(), 0);
    }

    #[tokio::test]
    async fn restart_mid_quiz_resets_progress() {
        let (handler, recorder) = setup();
        say(&handler, "u1", "/start").await;
        say(&handler, "u1", "A").await;
        say(&handler, "u1", "A").await;
        say(&handler, "u1", "/start").await;

        let session = handler.sessions().get("u1").await.unwrap();
        assert_eq!(session.current_question(), 0);
        assert_eq!(session.scores.total(), 0);

        for answer in ["B", "B", "C"] {
            say(&handler, "u1", answer).await;
        }
        let rows = recorder.rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, APPROVAL_SEEKER);
    }

    #[tokio::test]
    async fn other_commands_get_no_reply() {
        let (handler, _) = setup();
        assert!(say(&handler, "u1", "/help").await.is_none());
        assert!(handler.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn storage_failure_keeps_session_until_retry_succeeds() {
        let (handler, recorder) = setup();
        recorder.failing.store(true, Ordering::SeqCst);

        say(&handler, "u1", "/start").await;
        say(&handler, "u1", "B").await;
        say(&handler, "u1", "B").await;
        let reply = say(&handler, "u1", "A").await.unwrap();
        assert_eq!(reply.content, STORAGE_RETRY_NOTICE);
        assert!(recorder.rows().await.unwrap().is_empty());

        let kept = handler.sessions().get("u1").await.unwrap();
        assert_eq!(kept.current_question(), 3);

        // Still failing: nothing changes.
        let reply = say(&handler, "u1", "anything").await.unwrap();
        assert_eq!(reply.content, STORAGE_RETRY_NOTICE);
        assert_eq!(handler.sessions().get("u1").await.unwrap(), kept);

        recorder.failing.store(false, Ordering::SeqCst);
        let reply = say(&handler, "u1", "anything").await.unwrap();
        assert!(reply.content.contains(APPROVAL_SEEKER));

        let rows = recorder.rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, APPROVAL_SEEKER);
        assert!(handler.sessions().get("u1").await.is_none());
    }

    #[tokio::test]
    async fn record_timestamp_not_before_session_start() {
        let (handler, recorder) = setup();
        say(&handler, "u1", "/start").await;
        let started = handler.sessions().get("u1").await.unwrap().started_at;
        for answer in ["C", "C", "C"] {
            say(&handler, "u1", answer).await;
        }
        let row = &recorder.rows().await.unwrap()[0];
        let recorded = chrono::NaiveDateTime::parse_from_str(
            &format!("{} {}", row.date, row.time),
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();
        let started_local = started
            .with_timezone(&chrono::Local)
            .naive_local()
            .with_nanosecond(0)
            .unwrap();
        assert!(recorded >= started_local);
    }

    #[tokio::test]
    async fn two_users_do_not_share_scores() {
        let (handler, recorder) = setup();
        say(&handler, "alice", "/start").await;
        say(&handler, "bob", "/start").await;
        for (a, b) in [("A", "B"), ("A", "B"), ("A", "B")] {
            say(&handler, "alice", a).await;
            say(&handler, "bob", b).await;
        }
        let rows = recorder.rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "alice");
        assert_eq!(rows[0].category, CHRONIC_PLANNER);
        assert_eq!(rows[1].user_id, "bob");
        assert_eq!(rows[1].category, APPROVAL_SEEKER);
    }
}
