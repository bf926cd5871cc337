//! Context note use-case service.
//!
//! # Invariants
//! - A note's insight is computed once, before the note is written, and
//!   stored with it in a single insert.

use crate::capability::TextAnalysisCapability;
use crate::enrichment::InsightExtractor;
use crate::model::context_note::{ContextNote, ContextNoteId, NoteValidationError, SourceKind};
use crate::repo::context_repo::{ContextNoteRepository, NoteListQuery};
use crate::repo::RepoError;
use crate::time::now_epoch_ms;
use log::info;
use uuid::Uuid;

const RECENT_DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ContextServiceError {
    #[error(transparent)]
    Validation(#[from] NoteValidationError),
    #[error("context note not found: {0}")]
    NoteNotFound(ContextNoteId),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ContextServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteValidation(err) => Self::Validation(err),
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct ContextService<'cap, N> {
    repo: N,
    capability: &'cap dyn TextAnalysisCapability,
}

impl<'cap, N: ContextNoteRepository> ContextService<'cap, N> {
    pub fn new(repo: N, capability: &'cap dyn TextAnalysisCapability) -> Self {
        Self { repo, capability }
    }

    /// Stores a note together with the insight extracted from it alone.
    pub fn create_context_note(
        &self,
        content: impl Into<String>,
        source_kind: SourceKind,
    ) -> Result<ContextNote, ContextServiceError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(NoteValidationError::BlankContent.into());
        }

        let mut note = ContextNote {
            uuid: Uuid::new_v4(),
            content,
            source_kind,
            insight: None,
            created_at: now_epoch_ms(),
        };
        note.insight = Some(InsightExtractor::new(self.capability).analyze(&[note.as_input()]));

        let id = self.repo.insert_note(&note)?;
        info!(
            "event=context_note_create module=service status=ok note_id={} source={}",
            id,
            source_kind.as_str()
        );
        Ok(note)
    }

    /// Newest notes first; `None` or `0` means 20.
    pub fn recent_context_notes(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<ContextNote>, ContextServiceError> {
        let limit = limit.filter(|value| *value > 0).unwrap_or(RECENT_DEFAULT_LIMIT);
        Ok(self.repo.recent_notes(limit)?)
    }

    pub fn list_context_notes(
        &self,
        query: &NoteListQuery,
    ) -> Result<Vec<ContextNote>, ContextServiceError> {
        Ok(self.repo.list_notes(query)?)
    }

    pub fn get_context_note(
        &self,
        id: ContextNoteId,
    ) -> Result<Option<ContextNote>, ContextServiceError> {
        Ok(self.repo.get_note(id)?)
    }

    pub fn delete_context_note(&self, id: ContextNoteId) -> Result<(), ContextServiceError> {
        self.repo.delete_note(id)?;
        info!(
            "event=context_note_delete module=service status=ok note_id={}",
            id
        );
        Ok(())
    }
}
