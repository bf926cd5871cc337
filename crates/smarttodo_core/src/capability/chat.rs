//! Live capability backed by an OpenAI-compatible chat completions API.
//!
//! Uses a blocking reqwest client with bearer auth. The client-level timeout
//! is the only deadline applied to a call.

use super::{CapabilityError, CapabilityResult, CompletionRequest, TextAnalysisCapability};
use crate::config::CapabilityConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Network-backed text-analysis capability.
pub struct ChatCompletionsCapability {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsCapability {
    /// Builds a client for `{base_url}/chat/completions`.
    pub fn new(api_key: &str, config: &CapabilityConfig) -> CapabilityResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| CapabilityError::Transport(format!("client init failed: {err}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: config.model.clone(),
        })
    }
}

impl TextAnalysisCapability for ChatCompletionsCapability {
    fn is_enabled(&self) -> bool {
        true
    }

    fn complete(&self, request: &CompletionRequest) -> CapabilityResult<String> {
        let started_at = Instant::now();
        let body = ChatRequest {
            model: self.model.as_str(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_prompt.as_str(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt.as_str(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(CapabilityError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|err| CapabilityError::MalformedResponse(err.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CapabilityError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        debug!(
            "event=capability_complete module=capability status=ok purpose={} duration_ms={} response_chars={}",
            request.purpose.as_str(),
            started_at.elapsed().as_millis(),
            content.chars().count()
        );
        Ok(content)
    }
}

fn map_transport_error(err: reqwest::Error) -> CapabilityError {
    if err.is_timeout() {
        CapabilityError::Timeout
    } else {
        CapabilityError::Transport(err.to_string())
    }
}
