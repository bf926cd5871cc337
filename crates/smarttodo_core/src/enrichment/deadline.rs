//! Lead-time estimation and absolute deadline derivation.
//!
//! # Invariants
//! - Lead time is always within `[1, 30]` days.
//! - Any failure yields exactly 7 days.

use crate::capability::{
    CapabilityError, CapabilityResult, CompletionPurpose, CompletionRequest,
    TextAnalysisCapability,
};
use crate::enrichment::log_fallback;
use crate::model::task::TaskSnapshot;
use crate::time::{add_days, now_epoch_ms};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_LEAD_DAYS: u32 = 7;
pub const MIN_LEAD_DAYS: u32 = 1;
pub const MAX_LEAD_DAYS: u32 = 30;

const SYSTEM_PROMPT: &str =
    "You are an AI assistant for deadline estimation. Respond with only a number.";
const TEMPERATURE: f32 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 50;

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digits regex"));

pub struct DeadlineEstimator<'a> {
    capability: &'a dyn TextAnalysisCapability,
}

impl<'a> DeadlineEstimator<'a> {
    pub fn new(capability: &'a dyn TextAnalysisCapability) -> Self {
        Self { capability }
    }

    /// Absolute deadline relative to the current time.
    pub fn estimate(&self, task: &TaskSnapshot, current_load: u32) -> i64 {
        self.estimate_at(task, current_load, now_epoch_ms())
    }

    /// Absolute deadline relative to `now_ms`.
    pub fn estimate_at(&self, task: &TaskSnapshot, current_load: u32, now_ms: i64) -> i64 {
        add_days(now_ms, self.lead_days(task, current_load))
    }

    /// Suggested number of days from now, clamped to `[1, 30]`.
    pub fn lead_days(&self, task: &TaskSnapshot, current_load: u32) -> u32 {
        if !self.capability.is_enabled() {
            log_fallback("deadline", &CapabilityError::Disabled);
            return DEFAULT_LEAD_DAYS;
        }

        match self
            .capability
            .complete(&build_request(task, current_load))
            .and_then(|answer| parse_lead_days(&answer))
        {
            Ok(days) => {
                info!(
                    "event=deadline_estimate module=enrichment status=ok days={} load={}",
                    days, current_load
                );
                days
            }
            Err(err) => {
                log_fallback("deadline", &err);
                DEFAULT_LEAD_DAYS
            }
        }
    }
}

fn build_request(task: &TaskSnapshot, current_load: u32) -> CompletionRequest {
    let user_prompt = format!(
        "Based on this task information and current workload, suggest a realistic deadline:\n\n\
         Title: {title}\nDescription: {description}\n\n\
         Current pending tasks: {current_load}\n\n\
         Consider:\n\
         1. Task complexity\n\
         2. Current workload\n\
         3. Typical completion times\n\n\
         Respond with only the number of days from now ({MIN_LEAD_DAYS}-{MAX_LEAD_DAYS}):",
        title = task.title,
        description = task.description,
    );

    CompletionRequest {
        purpose: CompletionPurpose::Deadline,
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// First run of digits in `answer`, clamped to `[1, 30]`.
///
/// Digit runs too large for `u64` saturate to the upper bound.
pub(crate) fn parse_lead_days(answer: &str) -> CapabilityResult<u32> {
    let digits = DIGITS_RE
        .find(answer)
        .ok_or_else(|| CapabilityError::MalformedResponse("no number in answer".into()))?;
    let days = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
    let clamped = days.clamp(u64::from(MIN_LEAD_DAYS), u64::from(MAX_LEAD_DAYS));
    Ok(clamped as u32)
}
