use crate::decision::Decision;
use crate::directive::{Directive, DirectiveParseError};
use crate::prompt;
use async_trait::async_trait;
use exterm_memory::{Message, WorldModel};
use exterm_providers::{GenerateOptions, LLMProvider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("Oracle returned an empty response")]
    EmptyResponse,
    #[error("Oracle response is not a valid decision: {0}")]
    Schema(String),
    #[error("Oracle returned an unclassifiable directive: {0}")]
    UnclassifiedDirective(#[from] DirectiveParseError),
}

/// Everything the oracle sees for a regular turn.
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub transcript: &'a [Message],
    pub world_model: &'a WorldModel,
    pub user_input: &'a str,
}

/// A request scoped to one failing directive.
#[derive(Debug, Clone)]
pub struct RepairRequest {
    pub last_entry: Message,
    pub failing_command: String,
    pub error: String,
    /// The in-flight list the failure happened in.
    pub directives: Vec<Directive>,
    pub index: usize,
}

/// The reasoning oracle. Implementations must return a full replacement
/// list from `repair`, leaving entries before `index` unchanged.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn decide(&self, request: &OracleRequest<'_>) -> Result<Decision, OracleError>;

    async fn repair(&self, request: &RepairRequest) -> Result<Decision, OracleError>;
}

/// Oracle backed by a chat-completions provider in JSON mode.
pub struct LlmOracle {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: GenerateOptions,
}

impl LlmOracle {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32) -> Self {
        Self {
            provider,
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
            options: GenerateOptions {
                temperature: Some(temperature),
                json_response: true,
            },
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    async fn complete(
        &self,
        messages: &[exterm_providers::Message],
    ) -> Result<Decision, OracleError> {
        let response = self.provider.generate(messages, &self.options).await?;

        let content = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)?;
        debug!("Oracle replied ({}): {}", response.finish_reason, content);

        Decision::from_json(&content).map_err(|e| {
            warn!("Rejected oracle output: {}", e);
            e
        })
    }
}

fn to_wire(message: &Message) -> exterm_providers::Message {
    exterm_providers::Message::new(message.role.as_str(), message.content.clone())
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn decide(&self, request: &OracleRequest<'_>) -> Result<Decision, OracleError> {
        info!(
            "Querying {} with {} transcript entries for: {}",
            self.provider.name(),
            request.transcript.len(),
            request.user_input
        );

        let rendered =
            serde_json::to_string(request.world_model).unwrap_or_else(|_| "{}".to_string());
        let mut messages: Vec<_> = request.transcript.iter().map(to_wire).collect();
        messages.push(exterm_providers::Message::new(
            "system",
            prompt::world_model_message(&rendered),
        ));

        self.complete(&messages).await
    }

    async fn repair(&self, request: &RepairRequest) -> Result<Decision, OracleError> {
        info!(
            "Requesting repair of `{}` at index {}",
            request.failing_command, request.index
        );

        let messages = vec![
            exterm_providers::Message::new("system", self.system_prompt.clone()),
            to_wire(&request.last_entry),
            exterm_providers::Message::new("user", prompt::repair_instructions(request)),
        ];

        self.complete(&messages).await
    }
}
