//! libSQL backend: results sheet as a table.
//!
//! Rows are appended with a plain INSERT, so no read-modify-write is
//! needed; appends are still funnelled through one mutex to keep a single
//! writer per process.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::traits::{ClassificationRecord, ResultRecorder, SheetRow};

/// Table holding the results sheet.
const SHEET_TABLE: &str = "honey_path";

/// Column names of `SHEET_TABLE`, matching `SHEET_COLUMNS` by position.
const TABLE_COLUMNS: [&str; 4] = ["date", "time", "user_id", "category"];

pub struct LibSqlRecorder {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    write_lock: Mutex<()>,
}

impl LibSqlRecorder {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to open libSQL database: {e}")))?;
        let backend = Self::from_database(db)?;
        info!(path = %path.display(), "Results database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Unavailable(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            write_lock: Mutex::new(()),
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn table_columns(&self) -> Result<Vec<String>, StorageError> {
        let mut rows = self
            .conn()
            .query(&format!("PRAGMA table_info({SHEET_TABLE})"), ())
            .await
            .map_err(|e| StorageError::Query(format!("table_info: {e}")))?;

        let mut columns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StorageError::Query(format!("table_info: {e}")))?
        {
            let name: String = row
                .get(1)
                .map_err(|e| StorageError::Query(format!("table_info: {e}")))?;
            columns.push(name);
        }
        Ok(columns)
    }

    /// Create the sheet table if absent, or verify its layout. Callers hold
    /// `write_lock`.
    async fn prepare_table(&self) -> Result<(), StorageError> {
        let columns = self.table_columns().await?;
        if columns.is_empty() {
            self.conn()
                .execute(
                    &format!(
                        "CREATE TABLE IF NOT EXISTS {SHEET_TABLE} (
                            date TEXT NOT NULL,
                            time TEXT NOT NULL,
                            user_id TEXT NOT NULL,
                            category TEXT NOT NULL
                        )"
                    ),
                    (),
                )
                .await
                .map_err(|e| StorageError::Query(format!("create {SHEET_TABLE}: {e}")))?;
            info!(table = SHEET_TABLE, "Results table created");
            return Ok(());
        }

        if columns != TABLE_COLUMNS {
            return Err(StorageError::Schema {
                expected: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: columns,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResultRecorder for LibSqlRecorder {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.prepare_table().await
    }

    async fn record(&self, record: &ClassificationRecord) -> Result<(), StorageError> {
        let row = record.to_row();
        let _guard = self.write_lock.lock().await;
        self.prepare_table().await?;
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO {SHEET_TABLE} (date, time, user_id, category) VALUES (?1, ?2, ?3, ?4)"
                ),
                params![row.date, row.time, row.user_id, row.category],
            )
            .await
            .map_err(|e| StorageError::Query(format!("record: {e}")))?;
        debug!(user_id = %record.user_id, category = %record.category, "Result row inserted");
        Ok(())
    }

    async fn rows(&self) -> Result<Vec<SheetRow>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT date, time, user_id, category FROM {SHEET_TABLE} ORDER BY rowid"),
                (),
            )
            .await
            .map_err(|e| StorageError::Query(format!("rows: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StorageError::Query(format!("rows: {e}")))?
        {
            let get = |i: i32| -> Result<String, StorageError> {
                row.get::<String>(i)
                    .map_err(|e| StorageError::Query(format!("rows: {e}")))
            };
            out.push(SheetRow {
                date: get(0)?,
                time: get(1)?,
                user_id: get(2)?,
                category: get(3)?,
            });
        }
        Ok(out)
    }
}
