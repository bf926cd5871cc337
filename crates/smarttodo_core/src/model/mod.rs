//! Domain model for tasks, categories, context notes and insight records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own entity invariants (`validate`) so every layer enforces the same rules.
//!
//! # Invariants
//! - Tasks and context notes are identified by stable UUIDs.
//! - `Task::priority_score` is always within `[0, 10]`.
//! - `InsightRecord` has a well-defined zero value; it is never absent.

pub mod category;
pub mod context_note;
pub mod insight;
pub mod task;
