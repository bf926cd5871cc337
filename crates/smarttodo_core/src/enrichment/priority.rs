//! Advisory priority scores for a batch of tasks.
//!
//! # Invariants
//! - Output has the same length and order as the input.
//! - Every output score is within `[0, 10]`.
//! - On any failure the input scores come back unchanged.

use crate::capability::{
    CapabilityError, CapabilityResult, CompletionPurpose, CompletionRequest,
    TextAnalysisCapability,
};
use crate::enrichment::{json_array_span, log_fallback};
use crate::model::insight::InsightRecord;
use crate::model::task::{clamp_priority, TaskSnapshot};
use log::{debug, info};
use serde_json::Value;

const SYSTEM_PROMPT: &str =
    "You are an AI assistant specialized in task prioritization. Respond only with a JSON array of numbers.";
const TEMPERATURE: f32 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 200;

pub struct PriorityRanker<'a> {
    capability: &'a dyn TextAnalysisCapability,
}

impl<'a> PriorityRanker<'a> {
    pub fn new(capability: &'a dyn TextAnalysisCapability) -> Self {
        Self { capability }
    }

    /// Scores `tasks` in input order.
    ///
    /// A short answer only updates the matching prefix; extra entries are
    /// ignored.
    pub fn rank(&self, tasks: &[TaskSnapshot], insight: &InsightRecord) -> Vec<u8> {
        let mut scores: Vec<u8> = tasks.iter().map(|task| task.priority_score).collect();
        if tasks.is_empty() {
            return scores;
        }
        if !self.capability.is_enabled() {
            log_fallback("priority", &CapabilityError::Disabled);
            return scores;
        }

        let request = build_request(tasks, insight);
        match self
            .capability
            .complete(&request)
            .and_then(|answer| parse_scores(&answer))
        {
            Ok(raw) => {
                if raw.len() != tasks.len() {
                    debug!(
                        "event=priority_rank module=enrichment status=length_mismatch tasks={} scores={}",
                        tasks.len(),
                        raw.len()
                    );
                }
                for (slot, value) in scores.iter_mut().zip(raw) {
                    *slot = clamp_priority(value);
                }
                info!(
                    "event=priority_rank module=enrichment status=ok tasks={}",
                    tasks.len()
                );
            }
            Err(err) => log_fallback("priority", &err),
        }
        scores
    }
}

fn build_request(tasks: &[TaskSnapshot], insight: &InsightRecord) -> CompletionRequest {
    let tasks_text = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| format!("Task {}: {} - {}", index + 1, task.title, task.description))
        .collect::<Vec<_>>()
        .join("\n");
    let keywords = insight.keywords.join(", ");
    let urgency = insight.urgency_indicators.join(", ");

    let user_prompt = format!(
        "Based on the following tasks and context analysis, assign priority scores (0-10):\n\n\
         Tasks:\n{tasks_text}\n\n\
         Context Keywords: {keywords}\n\
         Urgency Indicators: {urgency}\n\n\
         Consider:\n\
         1. Urgency indicators from context\n\
         2. Deadlines if mentioned\n\
         3. Impact and importance\n\
         4. Dependencies\n\n\
         Respond with a JSON array containing exactly {count} priority scores, one per task in order, e.g. [8, 5, 9]",
        count = tasks.len()
    );

    CompletionRequest {
        purpose: CompletionPurpose::Priority,
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// Parses a JSON array of numbers. Fractions truncate toward zero; numeric
/// strings are accepted. Any other element rejects the whole answer.
pub(crate) fn parse_scores(answer: &str) -> CapabilityResult<Vec<i64>> {
    let span = json_array_span(answer)
        .ok_or_else(|| CapabilityError::MalformedResponse("no JSON array in answer".into()))?;
    let values: Vec<Value> = serde_json::from_str(span)
        .map_err(|err| CapabilityError::MalformedResponse(err.to_string()))?;

    values
        .iter()
        .map(|value| {
            score_from_value(value).ok_or_else(|| {
                CapabilityError::MalformedResponse(format!("non-numeric score `{value}`"))
            })
        })
        .collect()
}

fn score_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}
