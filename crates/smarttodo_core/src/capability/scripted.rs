//! Deterministic capability for tests and offline demos.

use super::{
    CapabilityError, CapabilityResult, CompletionPurpose, CompletionRequest,
    TextAnalysisCapability,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Capability that answers from preconfigured per-purpose responses.
///
/// Every request is recorded, including requests made while disabled, so
/// tests can assert which stages reached the capability.
pub struct ScriptedCapability {
    enabled: bool,
    responses: HashMap<CompletionPurpose, CapabilityResult<String>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCapability {
    /// Enabled capability with no responses registered yet.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Capability that reports itself disabled and fails every call.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled()
        }
    }

    /// Registers the raw answer text for `purpose`.
    pub fn with_response(mut self, purpose: CompletionPurpose, text: impl Into<String>) -> Self {
        self.responses.insert(purpose, Ok(text.into()));
        self
    }

    /// Registers a failure for `purpose`.
    pub fn with_failure(mut self, purpose: CompletionPurpose, error: CapabilityError) -> Self {
        self.responses.insert(purpose, Err(error));
        self
    }

    /// Requests received so far, in call order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Purposes of the requests received so far, in call order.
    pub fn call_purposes(&self) -> Vec<CompletionPurpose> {
        self.calls().into_iter().map(|call| call.purpose).collect()
    }
}

impl TextAnalysisCapability for ScriptedCapability {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn complete(&self, request: &CompletionRequest) -> CapabilityResult<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if !self.enabled {
            return Err(CapabilityError::Disabled);
        }

        match self.responses.get(&request.purpose) {
            Some(result) => result.clone(),
            None => Err(CapabilityError::Transport(format!(
                "no scripted response for purpose `{}`",
                request.purpose.as_str()
            ))),
        }
    }
}
