//! Context note repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Notes are insert-only apart from deletion; `insight_json` is written
//!   with the row and never updated.
//! - Recency order is `created_at DESC, uuid ASC`.

use crate::model::context_note::{ContextNote, ContextNoteId, SourceKind};
use crate::model::insight::InsightRecord;
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    content,
    source_kind,
    insight_json,
    created_at
FROM context_notes";

/// Number of notes used as enrichment material when none are named.
pub const RECENT_NOTES_FOR_ENRICHMENT: u32 = 10;
const NOTES_DEFAULT_LIMIT: u32 = 20;

/// Query options for listing context notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub source_kind: Option<SourceKind>,
    /// Defaults to 20 when `None` or `0`.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for context notes.
pub trait ContextNoteRepository {
    fn insert_note(&self, note: &ContextNote) -> RepoResult<ContextNoteId>;
    fn get_note(&self, id: ContextNoteId) -> RepoResult<Option<ContextNote>>;
    /// Newest `limit` notes.
    fn recent_notes(&self, limit: u32) -> RepoResult<Vec<ContextNote>>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<ContextNote>>;
    /// Loads notes in the order of `ids`; any missing id is `NoteNotFound`.
    fn get_notes(&self, ids: &[ContextNoteId]) -> RepoResult<Vec<ContextNote>>;
    fn delete_note(&self, id: ContextNoteId) -> RepoResult<()>;
    fn count_notes(&self) -> RepoResult<u32>;
}

/// SQLite-backed context note repository.
pub struct SqliteContextNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContextNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["context_notes"])?;
        Ok(Self { conn })
    }
}

impl ContextNoteRepository for SqliteContextNoteRepository<'_> {
    fn insert_note(&self, note: &ContextNote) -> RepoResult<ContextNoteId> {
        note.validate()?;

        let insight_json = match note.insight.as_ref() {
            Some(insight) => Some(serde_json::to_string(insight).map_err(|err| {
                RepoError::InvalidData(format!("cannot encode insight record: {err}"))
            })?),
            None => None,
        };

        self.conn.execute(
            "INSERT INTO context_notes (
                uuid,
                content,
                source_kind,
                insight_json,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.uuid.to_string(),
                note.content.as_str(),
                note.source_kind.as_str(),
                insight_json,
                note.created_at,
            ],
        )?;
        Ok(note.uuid)
    }

    fn get_note(&self, id: ContextNoteId) -> RepoResult<Option<ContextNote>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn recent_notes(&self, limit: u32) -> RepoResult<Vec<ContextNote>> {
        self.list_notes(&NoteListQuery {
            source_kind: None,
            limit: Some(limit),
            offset: 0,
        })
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<ContextNote>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.source_kind {
            sql.push_str(" AND source_kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC LIMIT ?");
        let limit = match query.limit {
            None | Some(0) => NOTES_DEFAULT_LIMIT,
            Some(value) => value,
        };
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_notes(&self, ids: &[ContextNoteId]) -> RepoResult<Vec<ContextNote>> {
        let mut notes = Vec::with_capacity(ids.len());
        for id in ids {
            let note = self.get_note(*id)?.ok_or(RepoError::NoteNotFound(*id))?;
            notes.push(note);
        }
        Ok(notes)
    }

    fn delete_note(&self, id: ContextNoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM context_notes WHERE uuid = ?1;",
                [id.to_string()],
            )?;
        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }
        Ok(())
    }

    fn count_notes(&self) -> RepoResult<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM context_notes;", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<ContextNote> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "context_notes.uuid")?;

    let kind_text: String = row.get("source_kind")?;
    let source_kind = SourceKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid source kind `{kind_text}` in context_notes.source_kind"
        ))
    })?;

    let insight = match row.get::<_, Option<String>>("insight_json")? {
        Some(text) => Some(serde_json::from_str::<InsightRecord>(&text).map_err(|err| {
            RepoError::InvalidData(format!("invalid insight json in context_notes: {err}"))
        })?),
        None => None,
    };

    let note = ContextNote {
        uuid,
        content: row.get("content")?,
        source_kind,
        insight,
        created_at: row.get("created_at")?,
    };
    note.validate()?;
    Ok(note)
}
