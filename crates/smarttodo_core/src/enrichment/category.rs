//! Category label suggestion for a single task.

use crate::capability::{
    CapabilityError, CompletionPurpose, CompletionRequest, TextAnalysisCapability,
};
use crate::enrichment::log_fallback;
use crate::model::category::{normalize_category_name, FALLBACK_CATEGORY};
use crate::model::task::TaskSnapshot;
use log::info;

/// Vocabulary offered to the capability. Answers outside it are accepted.
pub const SUGGESTED_CATEGORIES: [&str; 8] = [
    "Work", "Personal", "Health", "Finance", "Learning", "Shopping", "Home", "Travel",
];

const SYSTEM_PROMPT: &str =
    "You are an AI assistant for task categorization. Respond with only a category name.";
const TEMPERATURE: f32 = 0.3;
const MAX_OUTPUT_TOKENS: u32 = 20;

pub struct CategoryClassifier<'a> {
    capability: &'a dyn TextAnalysisCapability,
}

impl<'a> CategoryClassifier<'a> {
    pub fn new(capability: &'a dyn TextAnalysisCapability) -> Self {
        Self { capability }
    }

    /// Returns a non-blank category name; `"General"` on any failure.
    pub fn classify(&self, task: &TaskSnapshot) -> String {
        if !self.capability.is_enabled() {
            log_fallback("category", &CapabilityError::Disabled);
            return FALLBACK_CATEGORY.to_string();
        }

        let answer = match self.capability.complete(&build_request(task)) {
            Ok(answer) => answer,
            Err(err) => {
                log_fallback("category", &err);
                return FALLBACK_CATEGORY.to_string();
            }
        };

        match clean_label(&answer) {
            Some(label) => {
                info!("event=category_classify module=enrichment status=ok");
                label
            }
            None => {
                log_fallback(
                    "category",
                    &CapabilityError::MalformedResponse("unusable category label".into()),
                );
                FALLBACK_CATEGORY.to_string()
            }
        }
    }
}

fn build_request(task: &TaskSnapshot) -> CompletionRequest {
    let user_prompt = format!(
        "Categorize this task into one of these common categories or suggest a new one:\n\n\
         Common categories: {vocabulary}\n\n\
         Task:\nTitle: {title}\nDescription: {description}\n\n\
         Respond with only the category name:",
        vocabulary = SUGGESTED_CATEGORIES.join(", "),
        title = task.title,
        description = task.description,
    );

    CompletionRequest {
        purpose: CompletionPurpose::Category,
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// First non-blank line, without wrapping quotes or a trailing period.
/// Labels that are not valid category names are rejected.
fn clean_label(answer: &str) -> Option<String> {
    let line = answer
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?;
    let mut label = line;
    loop {
        let stripped = label
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
            .trim_end_matches('.')
            .trim();
        if stripped == label {
            break;
        }
        label = stripped;
    }
    normalize_category_name(label).ok()
}

#[cfg(test)]
mod tests {
    use super::{clean_label, CategoryClassifier};
    use crate::capability::{CapabilityError, CompletionPurpose, ScriptedCapability};
    use crate::model::task::TaskSnapshot;

    fn task() -> TaskSnapshot {
        TaskSnapshot {
            title: "Book flights to Lisbon".into(),
            description: String::new(),
            priority_score: 0,
        }
    }

    #[test]
    fn accepts_labels_outside_the_vocabulary() {
        let capability = ScriptedCapability::enabled()
            .with_response(CompletionPurpose::Category, "  Errands \n");
        assert_eq!(
            CategoryClassifier::new(&capability).classify(&task()),
            "Errands"
        );
    }

    #[test]
    fn blank_answers_and_failures_fall_back_to_general() {
        for capability in [
            ScriptedCapability::disabled(),
            ScriptedCapability::enabled().with_response(CompletionPurpose::Category, " \n "),
            ScriptedCapability::enabled().with_failure(
                CompletionPurpose::Category,
                CapabilityError::Status {
                    status: 429,
                    body: "rate limited".into(),
                },
            ),
        ] {
            assert_eq!(
                CategoryClassifier::new(&capability).classify(&task()),
                "General"
            );
        }
    }

    #[test]
    fn prompt_lists_vocabulary_and_task() {
        let capability =
            ScriptedCapability::enabled().with_response(CompletionPurpose::Category, "Travel");
        CategoryClassifier::new(&capability).classify(&task());

        let call = &capability.calls()[0];
        assert!(call.user_prompt.contains(
            "Work, Personal, Health, Finance, Learning, Shopping, Home, Travel"
        ));
        assert!(call.user_prompt.contains("Title: Book flights to Lisbon"));
        assert_eq!(call.max_output_tokens, 20);
    }

    #[test]
    fn clean_label_strips_decoration() {
        assert_eq!(clean_label("\"Work\".").as_deref(), Some("Work"));
        assert_eq!(clean_label("**'Finance.'**").as_deref(), Some("Finance"));
        assert_eq!(
            clean_label("\nHealth\nbecause it is a checkup").as_deref(),
            Some("Health")
        );
        assert_eq!(clean_label("\"\"").as_deref(), None);
        assert_eq!(clean_label(&"x".repeat(101)), None);
    }
}
