//! `ResultRecorder` trait: durable, append-only log of classifications.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Column headers of the results sheet, in order.
pub const SHEET_COLUMNS: [&str; 4] = ["Date", "Time", "UserID", "Category"];

/// One finished quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRecord {
    pub timestamp: DateTime<Local>,
    pub user_id: String,
    pub category: String,
}

impl ClassificationRecord {
    /// Record stamped with the current local time.
    pub fn now(user_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            user_id: user_id.into(),
            category: category.into(),
        }
    }

    /// Flatten into the persisted row shape.
    pub fn to_row(&self) -> SheetRow {
        SheetRow {
            date: self.timestamp.format("%Y-%m-%d").to_string(),
            time: self.timestamp.format("%H:%M:%S").to_string(),
            user_id: self.user_id.clone(),
            category: self.category.clone(),
        }
    }
}

/// A row as stored in the results sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "Category")]
    pub category: String,
}

/// Backend-agnostic result log.
///
/// `record` appends exactly one row per call and never drops a well-formed
/// record; deduplication is the caller's job. Implementations serialize
/// concurrent appends.
#[async_trait]
pub trait ResultRecorder: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Create the store and its sheet if absent; fail if an existing sheet
    /// has a different column layout.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Append one classification.
    async fn record(&self, record: &ClassificationRecord) -> Result<(), StorageError>;

    /// All rows in append order.
    async fn rows(&self) -> Result<Vec<SheetRow>, StorageError>;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn to_row_formats_date_and_time() {
        let record = ClassificationRecord {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap(),
            user_id: "123456".into(),
            category: "Chronic Planner Bear".into(),
        };
        let row = record.to_row();
        assert_eq!(row.date, "2024-03-09");
        assert_eq!(row.time, "07:05:03");
        assert_eq!(row.user_id, "123456");
        assert_eq!(row.category, "Chronic Planner Bear");
    }

    #[test]
    fn now_is_current() {
        let before = Local::now();
        let record = ClassificationRecord::now("1", "P");
        assert!(record.timestamp >= before);
    }
}
