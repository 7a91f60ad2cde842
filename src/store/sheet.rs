//! CSV sheet backend: one CSV file holds the results sheet.
//!
//! An append reads the whole sheet, checks the header, adds the row and
//! rewrites the file through a temp file + rename. The async mutex makes
//! that read-modify-write a single critical section per process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::traits::{ClassificationRecord, ResultRecorder, SHEET_COLUMNS, SheetRow};

pub struct CsvSheetRecorder {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvSheetRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StorageError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || f(&path))
            .await
            .map_err(|e| StorageError::Unavailable(format!("sheet task failed: {e}")))?
    }
}

#[async_trait]
impl ResultRecorder for CsvSheetRecorder {
    fn name(&self) -> &str {
        "csv"
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let created = self
            .blocking(|path| {
                if read_sheet(path)?.is_some() {
                    return Ok(false);
                }
                write_sheet(path, &[])?;
                Ok(true)
            })
            .await?;
        if created {
            info!(path = %self.path.display(), "Results sheet created");
        }
        Ok(())
    }

    async fn record(&self, record: &ClassificationRecord) -> Result<(), StorageError> {
        let row = record.to_row();
        let _guard = self.write_lock.lock().await;
        let count = self
            .blocking(move |path| {
                let mut rows = read_sheet(path)?.unwrap_or_default();
                rows.push(row);
                write_sheet(path, &rows)?;
                Ok(rows.len())
            })
            .await?;
        debug!(path = %self.path.display(), rows = count, "Result row appended");
        Ok(())
    }

    async fn rows(&self) -> Result<Vec<SheetRow>, StorageError> {
        let _guard = self.write_lock.lock().await;
        Ok(self.blocking(read_sheet).await?.unwrap_or_default())
    }
}

/// Read every row. `None` when the file is missing or empty (no sheet yet).
fn read_sheet(path: &Path) -> Result<Option<Vec<SheetRow>>, StorageError> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }

    let mut reader = csv::Reader::from_reader(file);
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers != SHEET_COLUMNS {
        return Err(StorageError::Schema {
            expected: SHEET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: headers,
        });
    }

    let rows = reader
        .deserialize::<SheetRow>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(rows))
}

/// Rewrite the whole sheet atomically.
fn write_sheet(path: &Path, rows: &[SheetRow]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(SHEET_COLUMNS)?;
        for row in rows {
            writer.write_record([&row.date, &row.time, &row.user_id, &row.category])?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn recorder(dir: &tempfile::TempDir) -> CsvSheetRecorder {
        CsvSheetRecorder::new(dir.path().join("data").join("HoneyTrack_Data.csv"))
    }

    #[tokio::test]
    async fn ensure_schema_creates_header_only_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        rec.ensure_schema().await.unwrap();

        let contents = std::fs::read_to_string(rec.path()).unwrap();
        assert_eq!(contents, "Date,Time,UserID,Category\n");
        assert!(rec.rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_schema_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        rec.record(&ClassificationRecord::now("1", "P")).await.unwrap();
        rec.ensure_schema().await.unwrap();
        assert_eq!(rec.rows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_appends_one_row_each() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        rec.ensure_schema().await.unwrap();

        let first = ClassificationRecord::now("111", "Chronic Planner Bear");
        let second = ClassificationRecord::now("222", "Approval Seeker Bear");
        rec.record(&first).await.unwrap();
        assert_eq!(rec.rows().await.unwrap().len(), 1);
        rec.record(&second).await.unwrap();

        let rows = rec.rows().await.unwrap();
        assert_eq!(rows, vec![first.to_row(), second.to_row()]);
    }

    #[tokio::test]
    async fn record_initializes_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        rec.record(&ClassificationRecord::now("1", "P")).await.unwrap();

        let contents = std::fs::read_to_string(rec.path()).unwrap();
        assert!(contents.starts_with("Date,Time,UserID,Category\n"));
    }

    #[tokio::test]
    async fn record_escapes_commas_in_fields() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        rec.record(&ClassificationRecord::now("1", "Bear, Planner"))
            .await
            .unwrap();
        assert_eq!(rec.rows().await.unwrap()[0].category, "Bear, Planner");
    }

    #[tokio::test]
    async fn malformed_header_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "When,Who\n2024-01-01,1\n").unwrap();
        let rec = CsvSheetRecorder::new(&path);

        let err = rec
            .record(&ClassificationRecord::now("1", "P"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Schema { .. }));
        assert!(rec.ensure_schema().await.is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "When,Who\n2024-01-01,1\n"
        );
    }

    #[tokio::test]
    async fn concurrent_records_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let rec = Arc::new(recorder(&dir));
        rec.ensure_schema().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let rec = Arc::clone(&rec);
            handles.push(tokio::spawn(async move {
                rec.record(&ClassificationRecord::now(i.to_string(), "P"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let rows = rec.rows().await.unwrap();
        assert_eq!(rows.len(), 20);
        let mut ids: Vec<u32> = rows.iter().map(|r| r.user_id.parse().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }
}
