//! Boundary to the external text-analysis capability.
//!
//! # Responsibility
//! - Define the `TextAnalysisCapability` contract consumed by enrichment.
//! - Select one implementation at process start and hand it out by reference.
//!
//! # Invariants
//! - Every failure is reported as `CapabilityError`; implementations never
//!   panic on bad responses.
//! - The disabled implementation never performs I/O.

use crate::config::CapabilityConfig;
use log::{info, warn};

mod chat;
mod disabled;
mod scripted;

pub use chat::ChatCompletionsCapability;
pub use disabled::DisabledCapability;
pub use scripted::ScriptedCapability;

pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Which enrichment stage issued a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionPurpose {
    Insight,
    Priority,
    Category,
    Deadline,
    Description,
}

impl CompletionPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insight => "insight",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::Deadline => "deadline",
            Self::Description => "description",
        }
    }
}

/// One `complete(systemPrompt, userPrompt, temperature, maxOutputTokens)` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub purpose: CompletionPurpose,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Failures at the capability boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("text analysis capability is disabled")]
    Disabled,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// External text-analysis capability.
///
/// Abstracts over transport (live HTTP, disabled, scripted) so enrichment
/// components don't depend on how completions are produced.
pub trait TextAnalysisCapability: Send + Sync {
    /// Whether AI-backed paths should be attempted at all.
    fn is_enabled(&self) -> bool;

    /// Runs one completion and returns the raw answer text.
    fn complete(&self, request: &CompletionRequest) -> CapabilityResult<String>;
}

/// Chooses the capability implementation for this process.
///
/// No credential means disabled; a client that cannot be built degrades to
/// disabled as well.
pub fn select_capability(config: &CapabilityConfig) -> Box<dyn TextAnalysisCapability> {
    let Some(api_key) = config.credential() else {
        info!(
            "event=capability_select module=capability status=ok mode=disabled reason=missing_credential"
        );
        return Box::new(DisabledCapability);
    };

    match ChatCompletionsCapability::new(api_key, config) {
        Ok(live) => {
            info!(
                "event=capability_select module=capability status=ok mode=live model={}",
                config.model
            );
            Box::new(live)
        }
        Err(err) => {
            warn!(
                "event=capability_select module=capability status=error mode=disabled reason=client_init_failed error={err}"
            );
            Box::new(DisabledCapability)
        }
    }
}
