//! Task creation with optional enrichment.
//!
//! # Responsibility
//! - Validate caller input and materialize the baseline task.
//! - Run the enrichment stages in fixed order when requested.
//! - Commit the merged task in one write.
//!
//! # Invariants
//! - Validation failures are raised before any stage runs and nothing is
//!   written for them.
//! - Stages run in order: insight, priority, description, category,
//!   deadline. Each one is guarded by its precondition so caller-supplied
//!   category and deadline are never replaced.
//! - Priority is always replaced when enrichment runs.
//! - The task row and its category usage bump become visible together; no
//!   intermediate state is written while the capability is being called.

use crate::capability::TextAnalysisCapability;
use crate::enrichment::{
    CategoryClassifier, DeadlineEstimator, DescriptionEnhancer, InsightExtractor, PriorityRanker,
};
use crate::model::context_note::ContextNote;
use crate::model::insight::InsightRecord;
use crate::model::task::{CategorySelector, NewTask, Task, TaskValidationError};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::context_repo::{ContextNoteRepository, RECENT_NOTES_FOR_ENRICHMENT};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use crate::service::task_service::TaskServiceError;
use crate::time::now_epoch_ms;
use log::info;
use uuid::Uuid;

/// Descriptions shorter than this many characters are sent for enhancement.
pub const DESCRIPTION_MIN_CHARS: usize = 20;

/// Which stages changed the task during one enrichment run.
#[derive(Debug, Clone, Copy, Default)]
struct EnrichmentReport {
    priority_changed: bool,
    description_enhanced: bool,
    category_suggested: bool,
    deadline_suggested: bool,
}

/// Sequences enrichment for one task creation.
pub struct EnrichmentOrchestrator<'a, T, C, N> {
    tasks: &'a T,
    categories: &'a C,
    notes: &'a N,
    capability: &'a dyn TextAnalysisCapability,
}

impl<'a, T, C, N> EnrichmentOrchestrator<'a, T, C, N>
where
    T: TaskRepository,
    C: CategoryRepository,
    N: ContextNoteRepository,
{
    pub fn new(
        tasks: &'a T,
        categories: &'a C,
        notes: &'a N,
        capability: &'a dyn TextAnalysisCapability,
    ) -> Self {
        Self {
            tasks,
            categories,
            notes,
            capability,
        }
    }

    /// Creates one task, enriching it first when `enhance_with_ai` is set.
    ///
    /// # Errors
    /// - `Validation` for bad input, including an unknown category id.
    /// - `Repo` when storage fails.
    pub fn create_task(
        &self,
        input: NewTask,
        enhance_with_ai: bool,
    ) -> Result<Task, TaskServiceError> {
        let priority_score = input.validate()?;
        if let Some(CategorySelector::Id(id)) = &input.category {
            if self.categories.get_category(*id)?.is_none() {
                return Err(TaskValidationError::UnknownCategory(*id).into());
            }
        }

        let now = now_epoch_ms();
        let mut task = Task {
            uuid: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            category_id: None,
            category_name: None,
            priority_score,
            deadline: input.deadline,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        let mut category = input.category;

        let report = if enhance_with_ai {
            Some(self.enrich(&mut task, &mut category)?)
        } else {
            None
        };

        let created = self.tasks.insert_task(&task, category.as_ref())?;
        match report {
            Some(report) => info!(
                "event=task_create module=enrichment status=ok task_id={} enriched=true priority_changed={} description_enhanced={} category_suggested={} deadline_suggested={}",
                created.uuid,
                report.priority_changed,
                report.description_enhanced,
                report.category_suggested,
                report.deadline_suggested
            ),
            None => info!(
                "event=task_create module=enrichment status=ok task_id={} enriched=false",
                created.uuid
            ),
        }
        Ok(created)
    }

    /// Applies stages 2 to 6 to the in-memory task.
    fn enrich(
        &self,
        task: &mut Task,
        category: &mut Option<CategorySelector>,
    ) -> RepoResult<EnrichmentReport> {
        let mut report = EnrichmentReport::default();
        let insight = self.recent_insight()?;
        let snapshot = task.snapshot();

        let batch = std::slice::from_ref(&snapshot);
        let ranked = PriorityRanker::new(self.capability).rank(batch, &insight);
        if let Some(score) = ranked.first().copied() {
            report.priority_changed = score != task.priority_score;
            task.priority_score = score;
        }

        if task.description.chars().count() < DESCRIPTION_MIN_CHARS {
            let enhanced = DescriptionEnhancer::new(self.capability).enhance(&snapshot, &insight);
            if !enhanced.trim().is_empty() && enhanced != task.description {
                task.description = enhanced;
                report.description_enhanced = true;
            }
        }

        if category.is_none() {
            let name = CategoryClassifier::new(self.capability).classify(&snapshot);
            *category = Some(CategorySelector::Name(name));
            report.category_suggested = true;
        }

        if task.deadline.is_none() {
            // The task being created counts towards the load it is judged by.
            let current_load = self
                .tasks
                .count_open_tasks()?
                .saturating_add(u32::from(task.status.is_open()));
            let estimator = DeadlineEstimator::new(self.capability);
            let deadline = estimator.estimate(&snapshot, current_load);
            task.deadline = Some(deadline);
            report.deadline_suggested = true;
        }

        Ok(report)
    }

    fn recent_insight(&self) -> RepoResult<InsightRecord> {
        let notes = self.notes.recent_notes(RECENT_NOTES_FOR_ENRICHMENT)?;
        let inputs: Vec<_> = notes.iter().map(ContextNote::as_input).collect();
        Ok(InsightExtractor::new(self.capability).analyze(&inputs))
    }
}
