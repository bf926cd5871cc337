//! Context notes to `InsightRecord`.

use crate::capability::{
    CapabilityError, CapabilityResult, CompletionPurpose, CompletionRequest,
    TextAnalysisCapability,
};
use crate::enrichment::{json_object_span, log_fallback};
use crate::model::context_note::NoteInput;
use crate::model::insight::InsightRecord;
use log::{debug, info};
use std::fmt::Write as _;

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in analyzing text for task \
management insights. Always respond with valid JSON.";
const TEMPERATURE: f32 = 0.3;
const MAX_OUTPUT_TOKENS: u32 = 1000;

const RESPONSE_SHAPE: &str = r#"{
    "keywords": ["list", "of", "relevant", "keywords"],
    "urgency_indicators": ["list", "of", "urgency", "signals"],
    "sentiment_score": 0.0,
    "common_themes": ["list", "of", "themes"],
    "time_references": ["list", "of", "time", "mentions"],
    "action_verbs": ["list", "of", "action", "words"]
}"#;

/// Extracts structured insight from a batch of notes.
pub struct InsightExtractor<'a> {
    capability: &'a dyn TextAnalysisCapability,
}

impl<'a> InsightExtractor<'a> {
    pub fn new(capability: &'a dyn TextAnalysisCapability) -> Self {
        Self { capability }
    }

    /// Returns the insight for `notes`, or the zero value when there is
    /// nothing to analyze or the capability cannot produce one.
    pub fn analyze(&self, notes: &[NoteInput<'_>]) -> InsightRecord {
        if notes.is_empty() {
            debug!("event=insight_extract module=enrichment status=skipped reason=no_notes");
            return InsightRecord::default();
        }
        if !self.capability.is_enabled() {
            log_fallback("insight", &CapabilityError::Disabled);
            return InsightRecord::default();
        }

        let request = build_request(notes);
        match self
            .capability
            .complete(&request)
            .and_then(|answer| parse_insight(&answer))
        {
            Ok(record) => {
                info!(
                    "event=insight_extract module=enrichment status=ok notes={} keywords={} urgency={}",
                    notes.len(),
                    record.keywords.len(),
                    record.urgency_indicators.len()
                );
                record
            }
            Err(err) => {
                log_fallback("insight", &err);
                InsightRecord::default()
            }
        }
    }
}

fn build_request(notes: &[NoteInput<'_>]) -> CompletionRequest {
    let mut entries = String::new();
    for note in notes {
        let _ = writeln!(
            entries,
            "Source: {}\nContent: {}\n",
            note.source_kind.label(),
            note.content
        );
    }

    let user_prompt = format!(
        "Analyze the following context entries and extract insights for task management:\n\n\
         {entries}\n\
         Please provide a JSON response with the following structure:\n\
         {RESPONSE_SHAPE}\n\n\
         Focus on extracting actionable insights that can help with task prioritization and categorization."
    );

    CompletionRequest {
        purpose: CompletionPurpose::Insight,
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// Parses the JSON object in `answer`; absent fields take their zero value.
pub(crate) fn parse_insight(answer: &str) -> CapabilityResult<InsightRecord> {
    let span = json_object_span(answer)
        .ok_or_else(|| CapabilityError::MalformedResponse("no JSON object in answer".into()))?;
    let mut record: InsightRecord = serde_json::from_str(span)
        .map_err(|err| CapabilityError::MalformedResponse(err.to_string()))?;
    if !record.sentiment_score.is_finite() {
        record.sentiment_score = 0.0;
    }
    Ok(record)
}
