//! services/api/src/adapters/completion.rs
//!
//! This module contains the adapter for the generation LLM.
//! It implements the `CompletionService` port from the `core` crate against any
//! OpenAI-compatible chat endpoint (OpenAI itself, or Gemini's compatibility API).

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use study_assistant_core::ports::{CompletionRequest, CompletionService, PortError, PortResult};
use tracing::debug;

use crate::config::GenerationConfig;

const SYSTEM_INSTRUCTIONS: &str = r#"You generate study material for Brazilian medical residency candidates.

Rules:
- Write every piece of content in Brazilian Portuguese.
- Reply with a single JSON value and nothing else: no prose, no markdown, no code fences.
- The JSON value MUST validate against the schema below.

SCHEMA:
{schema}"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the client for the configured provider.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base);
        }
        Self::new(Client::with_config(openai_config), config.model.clone())
    }
}

fn system_prompt(request: &CompletionRequest) -> String {
    SYSTEM_INSTRUCTIONS.replace("{schema}", &request.schema.to_string())
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiCompletionAdapter {
    async fn complete(&self, request: &CompletionRequest) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt(request))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(
            "Sending {} request to model {}.",
            request.capability.as_str(),
            self.model
        );
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        match response.choices.into_iter().next() {
            Some(choice) => choice.message.content.ok_or_else(|| {
                PortError::Unexpected(format!(
                    "{} response contained no text content.",
                    request.capability.as_str()
                ))
            }),
            None => Err(PortError::Unexpected(format!(
                "{} response returned no choices.",
                request.capability.as_str()
            ))),
        }
    }
}
