//! Persistence layer: append-only log of quiz classifications.

pub mod libsql_backend;
pub mod sheet;
pub mod traits;

use std::sync::Arc;

pub use libsql_backend::LibSqlRecorder;
pub use sheet::CsvSheetRecorder;
pub use traits::{ClassificationRecord, ResultRecorder, SHEET_COLUMNS, SheetRow};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StorageError;

/// Open the configured backend and make sure its sheet exists.
pub async fn open_recorder(config: &StoreConfig) -> Result<Arc<dyn ResultRecorder>, StorageError> {
    let recorder: Arc<dyn ResultRecorder> = match config.backend {
        StoreBackend::Csv => Arc::new(CsvSheetRecorder::new(&config.path)),
        StoreBackend::LibSql => Arc::new(LibSqlRecorder::new_local(&config.path).await?),
    };
    recorder.ensure_schema().await?;
    Ok(recorder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_recorder_initializes_csv_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Csv,
            path: dir.path().join("results.csv"),
        };
        let recorder = open_recorder(&config).await.unwrap();
        assert_eq!(recorder.name(), "csv");
        assert!(config.path.exists());
    }

    #[tokio::test]
    async fn open_recorder_initializes_libsql_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::LibSql,
            path: dir.path().join("results.db"),
        };
        let recorder = open_recorder(&config).await.unwrap();
        assert_eq!(recorder.name(), "libsql");
        recorder
            .record(&ClassificationRecord::now("1", "P"))
            .await
            .unwrap();
        assert_eq!(recorder.rows().await.unwrap().len(), 1);
    }
}
