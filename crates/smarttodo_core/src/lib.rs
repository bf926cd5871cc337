//! Core of the smart task manager.
//!
//! Owns the domain model, SQLite storage, the text-analysis capability
//! boundary and the context-driven enrichment pipeline. Front ends (the
//! `smarttodo` CLI) only compose these pieces.

pub mod capability;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod time;

pub use capability::{
    select_capability, CapabilityError, CapabilityResult, ChatCompletionsCapability,
    CompletionPurpose, CompletionRequest, DisabledCapability, ScriptedCapability,
    TextAnalysisCapability,
};
pub use config::{CapabilityConfig, ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId};
pub use model::context_note::{ContextNote, ContextNoteId, SourceKind};
pub use model::insight::InsightRecord;
pub use model::task::{CategorySelector, NewTask, Task, TaskId, TaskPatch, TaskStatus};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::context_repo::{ContextNoteRepository, NoteListQuery, SqliteContextNoteRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::category_service::{CategoryService, CategoryServiceError};
pub use service::context_service::{ContextService, ContextServiceError};
pub use service::suggestion_service::{
    SuggestionError, SuggestionRequest, SuggestionService, SuggestionType, Suggestions,
};
pub use service::task_service::{TaskService, TaskServiceError, TaskStats};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
