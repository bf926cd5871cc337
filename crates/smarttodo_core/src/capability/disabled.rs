use super::{CapabilityError, CapabilityResult, CompletionRequest, TextAnalysisCapability};

/// Capability used when no valid credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCapability;

impl TextAnalysisCapability for DisabledCapability {
    fn is_enabled(&self) -> bool {
        false
    }

    fn complete(&self, _request: &CompletionRequest) -> CapabilityResult<String> {
        Err(CapabilityError::Disabled)
    }
}
