//! Task use-case service.
//!
//! # Responsibility
//! - Create tasks, with or without enrichment.
//! - Provide get/list/update/delete and dashboard statistics.
//!
//! # Invariants
//! - Updates never re-run enrichment and never change category usage.
//! - `updated_at` moves forward on every successful update.

use crate::capability::TextAnalysisCapability;
use crate::enrichment::EnrichmentOrchestrator;
use crate::model::category::CategoryId;
use crate::model::task::{
    validate_priority, CategorySelector, NewTask, Task, TaskId, TaskPatch, TaskStatus,
    TaskValidationError,
};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::context_repo::ContextNoteRepository;
use crate::repo::task_repo::{TaskCounts, TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use crate::time::now_epoch_ms;
use log::info;
use serde::Serialize;

/// Service error for task use-cases.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    #[error(transparent)]
    Validation(#[from] TaskValidationError),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::TaskValidation(err) => Self::Validation(err),
            RepoError::CategoryName(err) => Self::Validation(err.into()),
            RepoError::CategoryNotFound(id) => {
                Self::Validation(TaskValidationError::UnknownCategory(id))
            }
            other => Self::Repo(other),
        }
    }
}

/// Dashboard counters across the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    #[serde(flatten)]
    pub tasks: TaskCounts,
    pub categories_count: u32,
    pub context_notes_count: u32,
}

/// Task service facade over repository implementations.
pub struct TaskService<'cap, T, C, N> {
    tasks: T,
    categories: C,
    notes: N,
    capability: &'cap dyn TextAnalysisCapability,
}

impl<'cap, T, C, N> TaskService<'cap, T, C, N>
where
    T: TaskRepository,
    C: CategoryRepository,
    N: ContextNoteRepository,
{
    pub fn new(
        tasks: T,
        categories: C,
        notes: N,
        capability: &'cap dyn TextAnalysisCapability,
    ) -> Self {
        Self {
            tasks,
            categories,
            notes,
            capability,
        }
    }

    /// Creates a task; see `EnrichmentOrchestrator::create_task`.
    pub fn create_task(
        &self,
        input: NewTask,
        enhance_with_ai: bool,
    ) -> Result<Task, TaskServiceError> {
        let orchestrator = EnrichmentOrchestrator::new(
            &self.tasks,
            &self.categories,
            &self.notes,
            self.capability,
        );
        orchestrator.create_task(input, enhance_with_ai)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, TaskServiceError> {
        Ok(self.tasks.get_task(id)?)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.tasks.list_tasks(query)?)
    }

    /// All tasks by priority, newest first within a score.
    pub fn prioritized_tasks(&self, limit: Option<u32>) -> Result<Vec<Task>, TaskServiceError> {
        self.list_tasks(&TaskListQuery {
            limit,
            ..TaskListQuery::default()
        })
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, TaskServiceError> {
        self.list_tasks(&TaskListQuery {
            status: Some(status),
            ..TaskListQuery::default()
        })
    }

    /// Applies `patch` to an existing task.
    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task, TaskServiceError> {
        let mut task = self
            .tasks
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority_score) = patch.priority_score {
            task.priority_score = validate_priority(priority_score)?;
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = deadline;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(category) = patch.category {
            task.category_id = match category {
                Some(selector) => Some(self.resolve_category(&selector)?),
                None => None,
            };
        }
        task.updated_at = now_epoch_ms().max(task.updated_at);

        self.tasks.update_task(&task)?;
        info!("event=task_update module=service status=ok task_id={}", id);
        self.tasks
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    pub fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Task, TaskServiceError> {
        self.update_task(
            id,
            TaskPatch {
                status: Some(status),
                ..TaskPatch::default()
            },
        )
    }

    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.tasks.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={}", id);
        Ok(())
    }

    /// Counters as of `now_ms`; overdue means open with a deadline before it.
    pub fn task_stats(&self, now_ms: i64) -> Result<TaskStats, TaskServiceError> {
        Ok(TaskStats {
            tasks: self.tasks.task_counts(now_ms)?,
            categories_count: self.categories.count_categories()?,
            context_notes_count: self.notes.count_notes()?,
        })
    }

    /// Resolves a selector for an update; no usage bump.
    fn resolve_category(
        &self,
        selector: &CategorySelector,
    ) -> Result<CategoryId, TaskServiceError> {
        match selector {
            CategorySelector::Id(id) => match self.categories.get_category(*id)? {
                Some(category) => Ok(category.id),
                None => Err(TaskValidationError::UnknownCategory(*id).into()),
            },
            CategorySelector::Name(name) => Ok(self.categories.get_or_create(name)?.id),
        }
    }
}
