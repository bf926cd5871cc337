//! AI-assisted task enrichment.
//!
//! # Responsibility
//! - Turn context notes into an `InsightRecord`.
//! - Propose priority, category, deadline and description for tasks.
//! - Sequence those stages for task creation (`orchestrator`).
//!
//! # Invariants
//! - Components never return errors. Every capability failure, disabled
//!   capability or unparseable answer degrades to a documented fallback.
//! - Components never touch storage; only the orchestrator does.

use crate::capability::CapabilityError;
use log::{info, warn};

pub mod category;
pub mod deadline;
pub mod description;
pub mod insight;
pub mod orchestrator;
pub mod priority;

pub use category::CategoryClassifier;
pub use deadline::DeadlineEstimator;
pub use description::DescriptionEnhancer;
pub use insight::InsightExtractor;
pub use orchestrator::EnrichmentOrchestrator;
pub use priority::PriorityRanker;

/// Records that `stage` fell back to its default value.
pub(crate) fn log_fallback(stage: &'static str, err: &CapabilityError) {
    match err {
        CapabilityError::Disabled => info!(
            "event=enrichment_fallback module=enrichment status=skipped stage={} reason=disabled",
            stage
        ),
        other => warn!(
            "event=enrichment_fallback module=enrichment status=degraded stage={} error={}",
            stage,
            crate::logging::single_line(&other.to_string(), 200)
        ),
    }
}

/// Slice from the first `{` to the last `}`, tolerating prose around JSON.
pub(crate) fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Slice from the first `[` to the last `]`.
pub(crate) fn json_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Trims an answer and discards it when nothing is left.
pub(crate) fn non_blank_answer(text: &str) -> Option<&str> {
    Some(text.trim()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{json_array_span, json_object_span, non_blank_answer};

    #[test]
    fn object_span_skips_prose_and_fences() {
        let text = "Sure!\n```json\n{\"keywords\": [\"a\"]}\n```";
        assert_eq!(json_object_span(text), Some("{\"keywords\": [\"a\"]}"));
        assert_eq!(json_object_span("no json here"), None);
        assert_eq!(json_object_span("} backwards {"), None);
    }

    #[test]
    fn array_span_finds_outer_brackets() {
        assert_eq!(json_array_span("scores: [7, 3]."), Some("[7, 3]"));
        assert_eq!(json_array_span("7"), None);
    }

    #[test]
    fn non_blank_answer_trims() {
        assert_eq!(non_blank_answer("  Work \n"), Some("Work"));
        assert_eq!(non_blank_answer(" \n\t"), None);
    }
}
