//! Read-only enrichment suggestions over existing tasks.
//!
//! # Responsibility
//! - Analyze named (or the most recent) context notes.
//! - Run one enrichment component over named (or all open) tasks.
//!
//! # Invariants
//! - Nothing is written; suggestions are advisory.
//! - Results follow the order of the requested task ids.
//! - Every named id must exist.

use crate::capability::TextAnalysisCapability;
use crate::enrichment::{
    CategoryClassifier, DeadlineEstimator, DescriptionEnhancer, InsightExtractor, PriorityRanker,
};
use crate::model::context_note::{ContextNote, ContextNoteId};
use crate::model::insight::InsightRecord;
use crate::model::task::{Task, TaskId};
use crate::repo::context_repo::{ContextNoteRepository, RECENT_NOTES_FOR_ENRICHMENT};
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use crate::time::now_epoch_ms;
use log::info;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error(
        "unknown suggestion type `{0}`; expected prioritization|categorization|deadline|enhancement"
    )]
    UnknownSuggestionType(String),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("context note not found: {0}")]
    NoteNotFound(ContextNoteId),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for SuggestionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    #[default]
    Prioritization,
    Categorization,
    Deadline,
    Enhancement,
}

impl SuggestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prioritization => "prioritization",
            Self::Categorization => "categorization",
            Self::Deadline => "deadline",
            Self::Enhancement => "enhancement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prioritization" => Some(Self::Prioritization),
            "categorization" => Some(Self::Categorization),
            "deadline" => Some(Self::Deadline),
            "enhancement" => Some(Self::Enhancement),
            _ => None,
        }
    }
}

impl FromStr for SuggestionType {
    type Err = SuggestionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| SuggestionError::UnknownSuggestionType(value.to_string()))
    }
}

/// Input of `get_suggestions`. Empty id lists mean "use the defaults".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub task_ids: Vec<TaskId>,
    pub context_note_ids: Vec<ContextNoteId>,
    pub suggestion_type: SuggestionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrioritySuggestion {
    pub task_id: TaskId,
    pub title: String,
    pub original_priority: u8,
    pub suggested_priority: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySuggestion {
    pub task_id: TaskId,
    pub title: String,
    pub current_category: Option<String>,
    pub suggested_category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineSuggestion {
    pub task_id: TaskId,
    pub title: String,
    pub current_deadline: Option<i64>,
    /// Unix epoch milliseconds.
    pub suggested_deadline: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptionSuggestion {
    pub task_id: TaskId,
    pub title: String,
    pub original_description: String,
    pub enhanced_description: String,
}

/// Stage-specific results, one entry per analyzed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    PrioritizedTasks(Vec<PrioritySuggestion>),
    CategorizedTasks(Vec<CategorySuggestion>),
    DeadlineSuggestions(Vec<DeadlineSuggestion>),
    EnhancedTasks(Vec<DescriptionSuggestion>),
}

impl SuggestionOutcome {
    pub fn len(&self) -> usize {
        match self {
            Self::PrioritizedTasks(items) => items.len(),
            Self::CategorizedTasks(items) => items.len(),
            Self::DeadlineSuggestions(items) => items.len(),
            Self::EnhancedTasks(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub context_analysis: InsightRecord,
    pub suggestion_type: SuggestionType,
    /// Unix epoch milliseconds.
    pub generated_at: i64,
    pub outcome: SuggestionOutcome,
}

pub struct SuggestionService<'cap, T, N> {
    tasks: T,
    notes: N,
    capability: &'cap dyn TextAnalysisCapability,
}

impl<'cap, T, N> SuggestionService<'cap, T, N>
where
    T: TaskRepository,
    N: ContextNoteRepository,
{
    pub fn new(tasks: T, notes: N, capability: &'cap dyn TextAnalysisCapability) -> Self {
        Self {
            tasks,
            notes,
            capability,
        }
    }

    pub fn get_suggestions(
        &self,
        request: &SuggestionRequest,
    ) -> Result<Suggestions, SuggestionError> {
        let notes = self.context_notes(&request.context_note_ids)?;
        let tasks = self.target_tasks(&request.task_ids)?;

        let inputs: Vec<_> = notes.iter().map(ContextNote::as_input).collect();
        let insight = InsightExtractor::new(self.capability).analyze(&inputs);
        let outcome = self.run_stage(request.suggestion_type, &tasks, &insight)?;

        info!(
            "event=suggestions module=service status=ok type={} notes={} tasks={}",
            request.suggestion_type.as_str(),
            notes.len(),
            tasks.len()
        );
        Ok(Suggestions {
            context_analysis: insight,
            suggestion_type: request.suggestion_type,
            generated_at: now_epoch_ms(),
            outcome,
        })
    }

    fn context_notes(&self, ids: &[ContextNoteId]) -> Result<Vec<ContextNote>, SuggestionError> {
        if ids.is_empty() {
            return Ok(self.notes.recent_notes(RECENT_NOTES_FOR_ENRICHMENT)?);
        }
        Ok(self.notes.get_notes(ids)?)
    }

    fn target_tasks(&self, ids: &[TaskId]) -> Result<Vec<Task>, SuggestionError> {
        if ids.is_empty() {
            let mut open = self.tasks.list_tasks(&TaskListQuery::default())?;
            open.retain(|task| task.status.is_open());
            return Ok(open);
        }
        ids.iter()
            .map(|id| {
                self.tasks
                    .get_task(*id)?
                    .ok_or(SuggestionError::TaskNotFound(*id))
            })
            .collect()
    }

    fn run_stage(
        &self,
        suggestion_type: SuggestionType,
        tasks: &[Task],
        insight: &InsightRecord,
    ) -> Result<SuggestionOutcome, SuggestionError> {
        let outcome = match suggestion_type {
            SuggestionType::Prioritization => {
                let snapshots: Vec<_> = tasks.iter().map(Task::snapshot).collect();
                let scores = PriorityRanker::new(self.capability).rank(&snapshots, insight);
                SuggestionOutcome::PrioritizedTasks(
                    tasks
                        .iter()
                        .zip(scores)
                        .map(|(task, suggested_priority)| PrioritySuggestion {
                            task_id: task.uuid,
                            title: task.title.clone(),
                            original_priority: task.priority_score,
                            suggested_priority,
                        })
                        .collect(),
                )
            }
            SuggestionType::Categorization => {
                let classifier = CategoryClassifier::new(self.capability);
                SuggestionOutcome::CategorizedTasks(
                    tasks
                        .iter()
                        .map(|task| CategorySuggestion {
                            task_id: task.uuid,
                            title: task.title.clone(),
                            current_category: task.category_name.clone(),
                            suggested_category: classifier.classify(&task.snapshot()),
                        })
                        .collect(),
                )
            }
            SuggestionType::Deadline => {
                let current_load = if tasks.is_empty() {
                    0
                } else {
                    self.tasks.count_open_tasks()?
                };
                let estimator = DeadlineEstimator::new(self.capability);
                SuggestionOutcome::DeadlineSuggestions(
                    tasks
                        .iter()
                        .map(|task| DeadlineSuggestion {
                            task_id: task.uuid,
                            title: task.title.clone(),
                            current_deadline: task.deadline,
                            suggested_deadline: estimator.estimate(&task.snapshot(), current_load),
                        })
                        .collect(),
                )
            }
            SuggestionType::Enhancement => {
                let enhancer = DescriptionEnhancer::new(self.capability);
                SuggestionOutcome::EnhancedTasks(
                    tasks
                        .iter()
                        .map(|task| DescriptionSuggestion {
                            task_id: task.uuid,
                            title: task.title.clone(),
                            original_description: task.description.clone(),
                            enhanced_description: enhancer.enhance(&task.snapshot(), insight),
                        })
                        .collect(),
                )
            }
        };
        Ok(outcome)
    }
}
