//! Context note domain model.
//!
//! # Invariants
//! - `content` is non-blank.
//! - `insight` is attached once, at creation, and never mutated afterwards.

use crate::model::insight::InsightRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for context notes.
pub type ContextNoteId = Uuid;

/// Where a context note came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Chat/messaging apps.
    Messaging,
    Email,
    Notes,
}

impl SourceKind {
    /// Stable storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Messaging => "messaging",
            Self::Email => "email",
            Self::Notes => "notes",
        }
    }

    /// Human label used when presenting notes to the text-analysis capability.
    pub fn label(self) -> &'static str {
        match self {
            Self::Messaging => "Messaging",
            Self::Email => "Email",
            Self::Notes => "Notes",
        }
    }

    /// Parses a source kind case-insensitively; `whatsapp` maps to `Messaging`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "messaging" | "whatsapp" => Some(Self::Messaging),
            "email" => Some(Self::Email),
            "notes" | "note" => Some(Self::Notes),
            _ => None,
        }
    }
}

impl FromStr for SourceKind {
    type Err = NoteValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| NoteValidationError::UnknownSourceKind(value.to_string()))
    }
}

/// Caller-visible validation failures for context note input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteValidationError {
    #[error("context note uuid must not be nil")]
    NilUuid,
    #[error("context note content must not be blank")]
    BlankContent,
    #[error("unknown context source kind `{0}`")]
    UnknownSourceKind(String),
}

/// Free-form text ingested as raw enrichment signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextNote {
    pub uuid: ContextNoteId,
    pub content: String,
    pub source_kind: SourceKind,
    pub insight: Option<InsightRecord>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl ContextNote {
    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.uuid.is_nil() {
            return Err(NoteValidationError::NilUuid);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::BlankContent);
        }
        Ok(())
    }

    /// The `(content, source)` pair consumed by insight extraction.
    pub fn as_input(&self) -> NoteInput<'_> {
        NoteInput {
            content: self.content.as_str(),
            source_kind: self.source_kind,
        }
    }
}

/// Borrowed note text handed to the insight extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteInput<'a> {
    pub content: &'a str,
    pub source_kind: SourceKind,
}
