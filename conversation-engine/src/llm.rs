use std::sync::Arc;

use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use common::error::AppError;

/// One turn from the language-model backend: either final text, or a batch
/// of tool invocations to run before asking again.
#[derive(Debug, Clone)]
pub enum ModelTurn {
    Content(String),
    ToolCalls(Vec<ChatCompletionMessageToolCall>),
}

/// Seam over the chat backend so the engine's state machine is testable
/// without a network round-trip.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<ModelTurn, AppError>;
}

pub struct OpenAiChatBackend {
    client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    model: String,
}

impl OpenAiChatBackend {
    pub fn new(
        client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        model: String,
    ) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatBackend {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<ModelTurn, AppError> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.model.clone()).messages(messages);
        if !tools.is_empty() {
            builder.tools(tools);
        }
        let request = builder.build()?;

        let response = self.client.chat().create(request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AppError::LLMParsing("No choices in chat completion response".into())
        })?;

        if let Some(tool_calls) = choice
            .message
            .tool_calls
            .filter(|tool_calls| !tool_calls.is_empty())
        {
            return Ok(ModelTurn::ToolCalls(tool_calls));
        }

        choice
            .message
            .content
            .map(ModelTurn::Content)
            .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))
    }
}
