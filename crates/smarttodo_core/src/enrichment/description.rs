//! Context-aware description elaboration.

use crate::capability::{
    CapabilityError, CompletionPurpose, CompletionRequest, TextAnalysisCapability,
};
use crate::enrichment::{log_fallback, non_blank_answer};
use crate::model::insight::InsightRecord;
use crate::model::task::TaskSnapshot;
use log::info;

const SYSTEM_PROMPT: &str =
    "You are an AI assistant that enhances task descriptions with contextual information.";
const TEMPERATURE: f32 = 0.4;
const MAX_OUTPUT_TOKENS: u32 = 250;
const CONTEXT_KEYWORDS: usize = 5;
const CONTEXT_THEMES: usize = 3;

pub struct DescriptionEnhancer<'a> {
    capability: &'a dyn TextAnalysisCapability,
}

impl<'a> DescriptionEnhancer<'a> {
    pub fn new(capability: &'a dyn TextAnalysisCapability) -> Self {
        Self { capability }
    }

    /// Returns an elaborated description, or `task.description` unchanged
    /// when the capability is disabled, fails, or answers blank.
    pub fn enhance(&self, task: &TaskSnapshot, insight: &InsightRecord) -> String {
        if !self.capability.is_enabled() {
            log_fallback("description", &CapabilityError::Disabled);
            return task.description.clone();
        }

        match self.capability.complete(&build_request(task, insight)) {
            Ok(answer) => match non_blank_answer(&answer) {
                Some(enhanced) => {
                    info!(
                        "event=description_enhance module=enrichment status=ok chars={}",
                        enhanced.chars().count()
                    );
                    enhanced.to_string()
                }
                None => {
                    log_fallback(
                        "description",
                        &CapabilityError::MalformedResponse("blank description".into()),
                    );
                    task.description.clone()
                }
            },
            Err(err) => {
                log_fallback("description", &err);
                task.description.clone()
            }
        }
    }
}

fn build_request(task: &TaskSnapshot, insight: &InsightRecord) -> CompletionRequest {
    let user_prompt = format!(
        "Enhance this task description with relevant contextual information:\n\n\
         Title: {title}\n\
         Current Description: {description}\n\n\
         Relevant Context:\n\
         - Keywords: {keywords}\n\
         - Themes: {themes}\n\n\
         Rules:\n\
         1. Keep the original meaning intact\n\
         2. Add helpful contextual details\n\
         3. Make it more actionable\n\
         4. Keep it concise (under 200 words)\n\n\
         Enhanced description:",
        title = task.title,
        description = task.description,
        keywords = insight.top_keywords(CONTEXT_KEYWORDS).join(", "),
        themes = insight.top_themes(CONTEXT_THEMES).join(", "),
    );

    CompletionRequest {
        purpose: CompletionPurpose::Description,
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

#[cfg(test)]
mod tests {
    use super::DescriptionEnhancer;
    use crate::capability::{CapabilityError, CompletionPurpose, ScriptedCapability};
    use crate::model::insight::InsightRecord;
    use crate::model::task::TaskSnapshot;

    fn task(description: &str) -> TaskSnapshot {
        TaskSnapshot {
            title: "Call plumber".into(),
            description: description.into(),
            priority_score: 0,
        }
    }

    #[test]
    fn disabled_is_identity() {
        let capability = ScriptedCapability::disabled();
        let insight = InsightRecord {
            keywords: vec!["leak".into()],
            ..InsightRecord::default()
        };
        for description in ["", "kitchen sink", "  spaced  "] {
            assert_eq!(
                DescriptionEnhancer::new(&capability).enhance(&task(description), &insight),
                description
            );
        }
    }

    #[test]
    fn blank_or_failed_answers_keep_original() {
        for capability in [
            ScriptedCapability::enabled().with_response(CompletionPurpose::Description, "  \n"),
            ScriptedCapability::enabled().with_failure(
                CompletionPurpose::Description,
                CapabilityError::Transport("connection reset".into()),
            ),
        ] {
            assert_eq!(
                DescriptionEnhancer::new(&capability)
                    .enhance(&task("kitchen sink"), &InsightRecord::default()),
                "kitchen sink"
            );
        }
    }

    #[test]
    fn answer_is_trimmed_and_prompt_uses_top_context() {
        let capability = ScriptedCapability::enabled().with_response(
            CompletionPurpose::Description,
            "\n Call the plumber about the kitchen sink leak before Friday. \n",
        );
        let insight = InsightRecord {
            keywords: (1..=7).map(|i| format!("k{i}")).collect(),
            common_themes: (1..=4).map(|i| format!("t{i}")).collect(),
            ..InsightRecord::default()
        };

        let enhanced = DescriptionEnhancer::new(&capability).enhance(&task(""), &insight);
        assert_eq!(
            enhanced,
            "Call the plumber about the kitchen sink leak before Friday."
        );

        let prompt = &capability.calls()[0].user_prompt;
        assert!(prompt.contains("- Keywords: k1, k2, k3, k4, k5\n"));
        assert!(prompt.contains("- Themes: t1, t2, t3\n"));
    }
}
