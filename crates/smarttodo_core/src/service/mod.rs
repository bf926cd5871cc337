//! Core use-case services.
//!
//! # Responsibility
//! - Compose repositories, enrichment and the capability into the
//!   caller-facing operations.
//! - Translate repository errors into per-use-case error enums.

pub mod category_service;
pub mod context_service;
pub mod suggestion_service;
pub mod task_service;
