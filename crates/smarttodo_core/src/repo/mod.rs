//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/enrichment orchestration.
//!
//! # Invariants
//! - Repository writes enforce entity `validate()` before persistence.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.
//! - Category usage only changes inside the transaction that inserts a new
//!   task.

use crate::db::DbError;
use crate::model::category::{CategoryId, CategoryNameError};
use crate::model::context_note::{ContextNoteId, NoteValidationError};
use crate::model::task::{TaskId, TaskValidationError};
use rusqlite::Connection;

pub mod category_repo;
pub mod context_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by task, category and context note storage.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    TaskValidation(#[from] TaskValidationError),
    #[error(transparent)]
    NoteValidation(#[from] NoteValidationError),
    #[error(transparent)]
    CategoryName(#[from] CategoryNameError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("context note not found: {0}")]
    NoteNotFound(ContextNoteId),
    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),
    #[error("category name already in use: `{0}`")]
    CategoryNameConflict(String),
    #[error("required table is missing: {0}")]
    MissingRequiredTable(&'static str),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
