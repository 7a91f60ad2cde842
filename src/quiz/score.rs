//! Per-session score board.

use serde::{Deserialize, Serialize};

/// Running score per category, kept in canonical (declaration) order.
///
/// Boards are values: applying deltas returns a new board, so a session
/// snapshot never changes underneath a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    entries: Vec<(String, i64)>,
}

impl ScoreBoard {
    /// All-zero board over the given categories, in the order given.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: categories.into_iter().map(|c| (c.into(), 0)).collect(),
        }
    }

    /// Score for a category, `None` if the board does not track it.
    pub fn get(&self, category: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, score)| *score)
    }

    /// Add each delta to its category. Unknown categories are skipped; the
    /// engine validates deltas against the category list at startup.
    pub fn apply(&self, deltas: &[(String, i64)]) -> Self {
        let mut next = self.clone();
        for (category, delta) in deltas {
            if let Some(entry) = next.entries.iter_mut().find(|(name, _)| name == category) {
                entry.1 += delta;
            } else {
                tracing::debug!(category = %category, "Delta for untracked category ignored");
            }
        }
        next
    }

    /// Category with the strictly greatest score; on a tie the category
    /// declared first wins. `None` only for an empty board.
    pub fn leader(&self) -> Option<&str> {
        let mut best: Option<&(String, i64)> = None;
        for entry in &self.entries {
            match best {
                Some((_, top)) if entry.1 <= *top => {}
                _ => best = Some(entry),
            }
        }
        best.map(|(name, _)| name.as_str())
    }

    /// Iterate `(category, score)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|(_, score)| score).sum()
    }
}

impl std::fmt::Display for ScoreBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(name, score)| format!("{name}={score}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
