//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted task record and the caller-facing create/update
//!   inputs.
//! - Validate caller input before anything is enriched or written.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another task.
//! - `priority_score` stays within `[PRIORITY_MIN, PRIORITY_MAX]`.
//! - `title` is non-blank and at most `TITLE_MAX_CHARS` chars.

use crate::model::category::{CategoryId, CategoryNameError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for tasks.
pub type TaskId = Uuid;

pub const PRIORITY_MIN: u8 = 0;
pub const PRIORITY_MAX: u8 = 10;
pub const TITLE_MAX_CHARS: usize = 255;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    #[default]
    Pending,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

impl TaskStatus {
    /// Stable storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parses a status label case-insensitively.
    ///
    /// Accepts storage values plus the display forms `In Progress` and
    /// `in-progress`.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Returns whether the task still counts towards current workload.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl FromStr for TaskStatus {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| TaskValidationError::UnknownStatus(value.to_string()))
    }
}

/// Caller-visible validation failures for task input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskValidationError {
    #[error("task uuid must not be nil")]
    NilUuid,
    #[error("task title must not be blank")]
    BlankTitle,
    #[error("task title has {len} chars; at most {max} allowed")]
    TitleTooLong { len: usize, max: usize },
    #[error("priority score {0} is outside [0, 10]")]
    PriorityOutOfRange(i64),
    #[error("unknown task status `{0}`")]
    UnknownStatus(String),
    #[error("unknown category id {0}")]
    UnknownCategory(CategoryId),
    #[error("invalid category: {0}")]
    Category(#[from] CategoryNameError),
}

/// Persisted task with its joined category projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: TaskId,
    pub title: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
    /// Read-only projection of the referenced category name.
    pub category_name: Option<String>,
    pub priority_score: u8,
    /// Unix epoch milliseconds.
    pub deadline: Option<i64>,
    pub status: TaskStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Task {
    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.uuid.is_nil() {
            return Err(TaskValidationError::NilUuid);
        }
        validate_title(&self.title)?;
        if self.priority_score > PRIORITY_MAX {
            return Err(TaskValidationError::PriorityOutOfRange(i64::from(self.priority_score)));
        }
        Ok(())
    }

    /// Read-only view handed to enrichment components.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            title: self.title.clone(),
            description: self.description.clone(),
            priority_score: self.priority_score,
        }
    }
}

/// The fields enrichment components are allowed to look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub title: String,
    pub description: String,
    pub priority_score: u8,
}

/// How a caller refers to a category when creating or updating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelector {
    /// Existing category row; unknown ids are a validation failure.
    Id(CategoryId),
    /// Category name with get-or-create semantics.
    Name(String),
}

/// Caller input for task creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: Option<CategorySelector>,
    /// Raw caller value; validated into `[0, 10]`.
    pub priority_score: i64,
    pub deadline: Option<i64>,
    pub status: TaskStatus,
}

impl NewTask {
    /// Creates input with an empty description, priority 0 and `Pending`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: None,
            priority_score: 0,
            deadline: None,
            status: TaskStatus::Pending,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority_score: i64) -> Self {
        self.priority_score = priority_score;
        self
    }

    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: CategorySelector) -> Self {
        self.category = Some(category);
        self
    }

    /// Validates input fields and returns the checked priority.
    pub fn validate(&self) -> Result<u8, TaskValidationError> {
        validate_title(&self.title)?;
        if let Some(CategorySelector::Name(name)) = &self.category {
            crate::model::category::normalize_category_name(name)?;
        }
        validate_priority(self.priority_score)
    }
}

/// Partial update for an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority_score: Option<i64>,
    /// `Some(None)` clears the deadline.
    pub deadline: Option<Option<i64>>,
    pub status: Option<TaskStatus>,
    /// `Some(None)` detaches the category.
    pub category: Option<Option<CategorySelector>>,
}

/// Validates a raw priority score into the persisted range.
pub fn validate_priority(value: i64) -> Result<u8, TaskValidationError> {
    if (i64::from(PRIORITY_MIN)..=i64::from(PRIORITY_MAX)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(TaskValidationError::PriorityOutOfRange(value))
    }
}

/// Clamps any integer score into `[0, 10]`.
pub fn clamp_priority(value: i64) -> u8 {
    value.clamp(i64::from(PRIORITY_MIN), i64::from(PRIORITY_MAX)) as u8
}

fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    let len = title.chars().count();
    if len > TITLE_MAX_CHARS {
        return Err(TaskValidationError::TitleTooLong {
            len,
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(())
}
