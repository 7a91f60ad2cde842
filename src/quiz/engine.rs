//! QuizEngine: applies answers to session snapshots and classifies.

use std::collections::HashSet;

use crate::error::QuizError;

use super::definition::{CategoryDef, QuizDefinition};
use super::score::ScoreBoard;
use super::state::Session;

/// A question ready to be sent: display text plus the option codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub options: Vec<String>,
}

/// Result of an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NextPrompt(Prompt),
    Complete(String),
}

#[derive(Debug, Clone)]
struct AnswerChoice {
    code: String,
    label: String,
    deltas: Vec<(String, i64)>,
}

#[derive(Debug, Clone)]
struct Question {
    prompt: String,
    choices: Vec<AnswerChoice>,
}

impl Question {
    fn choice(&self, code: &str) -> Option<&AnswerChoice> {
        self.choices.iter().find(|c| c.code == code)
    }
}

/// Holds the validated question list and canonical category order.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    intro: Option<String>,
    categories: Vec<CategoryDef>,
    questions: Vec<Question>,
}

impl QuizEngine {
    /// Validate a definition and build the engine.
    pub fn new(def: QuizDefinition) -> Result<Self, QuizError> {
        if def.categories.len() < 2 {
            return Err(QuizError::InvalidDefinition(format!(
                "need at least 2 categories, got {}",
                def.categories.len()
            )));
        }
        let mut seen = HashSet::new();
        for category in &def.categories {
            if !seen.insert(category.name.as_str()) {
                return Err(QuizError::InvalidDefinition(format!(
                    "duplicate category {:?}",
                    category.name
                )));
            }
        }
        if def.questions.is_empty() {
            return Err(QuizError::InvalidDefinition("quiz has no questions".into()));
        }

        let mut questions = Vec::with_capacity(def.questions.len());
        for (index, question) in def.questions.into_iter().enumerate() {
            if question.options.is_empty() {
                return Err(QuizError::InvalidDefinition(format!(
                    "question {index} has no options"
                )));
            }
            let mut codes = HashSet::new();
            let mut choices = Vec::with_capacity(question.options.len());
            for option in question.options {
                if !codes.insert(code_key(&option.code)) {
                    return Err(QuizError::InvalidDefinition(format!(
                        "question {index} repeats option {:?}",
                        option.code
                    )));
                }
                if let Some(unknown) = option.deltas.keys().find(|k| !seen.contains(k.as_str())) {
                    return Err(QuizError::InvalidDefinition(format!(
                        "question {index} option {:?} scores unknown category {unknown:?}",
                        option.code
                    )));
                }
                // Store deltas in canonical order so application is deterministic.
                let deltas = def
                    .categories
                    .iter()
                    .filter_map(|c| option.deltas.get(&c.name).map(|d| (c.name.clone(), *d)))
                    .collect();
                choices.push(AnswerChoice {
                    code: option.code,
                    label: option.label,
                    deltas,
                });
            }
            questions.push(Question {
                prompt: question.prompt,
                choices,
            });
        }

        Ok(Self {
            intro: def.intro,
            categories: def.categories,
            questions,
        })
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Category names in canonical order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Plan text for a category.
    pub fn plan_for(&self, category: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.plan.as_str())
    }

    /// Start a fresh session and return the first prompt.
    pub fn begin(&self, user_id: impl Into<String>) -> (Session, Prompt) {
        let session = Session::new(user_id, ScoreBoard::new(self.categories()));
        let prompt = self.render(0);
        (session, prompt)
    }

    /// Prompt for the question at `index`, if it exists.
    pub fn prompt(&self, index: usize) -> Option<Prompt> {
        (index < self.questions.len()).then(|| self.render(index))
    }

    /// Prompt for the question the session is waiting on.
    pub fn current_prompt(&self, session: &Session) -> Option<Prompt> {
        self.prompt(session.current_question())
    }

    /// Match raw user text to an option code of question `index`,
    /// ignoring surrounding whitespace and case.
    pub fn match_option(&self, index: usize, raw: &str) -> Option<&str> {
        let wanted = code_key(raw);
        self.questions
            .get(index)?
            .choices
            .iter()
            .find(|c| code_key(&c.code) == wanted)
            .map(|c| c.code.as_str())
    }

    /// Apply an answer to a session snapshot.
    ///
    /// The input session is never modified; on success the caller receives
    /// the next snapshot alongside the outcome.
    pub fn submit(&self, session: &Session, code: &str) -> Result<(Session, Outcome), QuizError> {
        let index = session.current_question();
        let total = self.questions.len();
        let question = self
            .questions
            .get(index)
            .ok_or(QuizError::AlreadyComplete { questions: total })?;

        let choice = question.choice(code).ok_or_else(|| QuizError::InvalidAnswer {
            question: index,
            answer: code.to_string(),
        })?;

        let state = session
            .state
            .next(total)
            .ok_or(QuizError::AlreadyComplete { questions: total })?;

        let next = Session {
            user_id: session.user_id.clone(),
            state,
            scores: session.scores.apply(&choice.deltas),
            started_at: session.started_at,
        };

        let outcome = if state.is_terminal(total) {
            // Non-empty by construction: at least two categories.
            let category = next.scores.leader().unwrap_or_default().to_string();
            Outcome::Complete(category)
        } else {
            Outcome::NextPrompt(self.render(state.index()))
        };

        tracing::debug!(
            user_id = %next.user_id,
            question = index,
            answer = %choice.code,
            scores = %next.scores,
            "Answer applied"
        );

        Ok((next, outcome))
    }

    pub fn is_complete(&self, session: &Session) -> bool {
        session.state.is_terminal(self.questions.len())
    }

    /// Classification of a completed session; `None` while in progress.
    pub fn classify(&self, session: &Session) -> Option<String> {
        if !self.is_complete(session) {
            return None;
        }
        session.scores.leader().map(String::from)
    }

    fn render(&self, index: usize) -> Prompt {
        let question = &self.questions[index];
        let mut lines = Vec::with_capacity(question.choices.len() + 2);
        if index == 0 {
            if let Some(ref intro) = self.intro {
                lines.push(intro.clone());
            }
        }
        lines.push(format!("{}. {}", index + 1, question.prompt));
        for choice in &question.choices {
            lines.push(format!("{}) {}", choice.code, choice.label));
        }
        Prompt {
            text: lines.join("\n"),
            options: question.choices.iter().map(|c| c.code.clone()).collect(),
        }
    }
}

/// Case-folded form under which option codes are compared.
fn code_key(code: &str) -> String {
    code.trim().to_uppercase()
}
