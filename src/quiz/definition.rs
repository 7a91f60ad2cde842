//! Quiz definition: categories, plans, and questions.
//!
//! A definition is plain data. It can come from the built-in catalog or be
//! deserialized from a JSON file; `QuizEngine::new` validates it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A category the quiz can classify into, with the plan sent on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    pub plan: String,
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Short code the user sends back, e.g. "A".
    pub code: String,
    /// Human-readable text shown next to the code.
    pub label: String,
    /// Score added per category when this option is chosen.
    #[serde(default)]
    pub deltas: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDef {
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

/// Full quiz description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    /// Heading prepended to the first question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    /// Categories in canonical order. Ties are broken by this order.
    pub categories: Vec<CategoryDef>,
    pub questions: Vec<QuestionDef>,
}

impl QuizDefinition {
    /// Load a definition from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::QuizFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
