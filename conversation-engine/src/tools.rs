use std::sync::Arc;

use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionTool, ChatCompletionToolType, FunctionObject,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use common::error::AppError;

use crate::notify::NotificationSink;

/// A named side-effecting action the model may request before answering.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn definition(&self) -> ChatCompletionTool;
    async fn execute(&self, arguments: Value) -> Result<Value, AppError>;
}

/// The result of one tool invocation, tagged with the correlation id the
/// model attached to the call so it can be reinjected into the transcript.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub tool_call_id: String,
    pub content: Value,
}

/// Explicit name-to-handler mapping, fixed at construction. Tool catalogs
/// evolve independently of registered handlers, so an unknown name resolves
/// to an empty result instead of an error.
pub struct ToolDispatcher {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn with_builtin_tools(sink: Arc<dyn NotificationSink>) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Arc::new(RecordUserDetails {
            sink: Arc::clone(&sink),
        }));
        dispatcher.register(Arc::new(RecordUnknownQuestion { sink }));
        dispatcher
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// The tool definitions advertised to the model, in registration order.
    pub fn catalog(&self) -> Vec<ChatCompletionTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub async fn dispatch(&self, call: &ChatCompletionMessageToolCall) -> ToolOutcome {
        let name = call.function.name.as_str();

        let content = match self.tools.iter().find(|tool| tool.name() == name) {
            Some(tool) => match serde_json::from_str::<Value>(&call.function.arguments) {
                Ok(arguments) => match tool.execute(arguments).await {
                    Ok(result) => result,
                    Err(err) => {
                        warn!(tool = name, error = %err, "tool execution failed");
                        json!({})
                    }
                },
                Err(err) => {
                    warn!(tool = name, error = %err, "malformed tool arguments");
                    json!({})
                }
            },
            None => {
                warn!(tool = name, "model requested unregistered tool");
                json!({})
            }
        };

        ToolOutcome {
            tool_call_id: call.id.clone(),
            content,
        }
    }
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Records a visitor who wants to be in touch and left an email address.
pub struct RecordUserDetails {
    sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Deserialize)]
struct RecordUserDetailsArgs {
    email: String,
    name: Option<String>,
    notes: Option<String>,
}

#[async_trait]
impl Tool for RecordUserDetails {
    fn name(&self) -> &'static str {
        "record_user_details"
    }

    fn definition(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name().to_string(),
                description: Some(
                    "Use this tool to record that a user is interested in being in touch and \
                     provided an email address"
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "email": {
                            "type": "string",
                            "description": "The email address of this user"
                        },
                        "name": {
                            "type": "string",
                            "description": "The user's name, if they provided it"
                        },
                        "notes": {
                            "type": "string",
                            "description": "Any additional information about the conversation that's worth recording to give context"
                        }
                    },
                    "required": ["email"],
                    "additionalProperties": false
                })),
                strict: None,
            },
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, AppError> {
        let args: RecordUserDetailsArgs = serde_json::from_value(arguments)
            .map_err(|err| AppError::Validation(format!("record_user_details arguments: {err}")))?;

        let name = args.name.as_deref().unwrap_or("Name not provided");
        let notes = args.notes.as_deref().unwrap_or("not provided");
        let message = format!(
            "Recording {name} with email {email} and notes {notes}",
            email = args.email
        );

        // Delivery is best-effort; a dead sink must never fail the turn.
        if let Err(err) = self.sink.notify(&message).await {
            warn!(error = %err, "lead notification delivery failed");
        }

        Ok(json!({"recorded": "ok"}))
    }
}

/// Flags a question the persona could not answer.
pub struct RecordUnknownQuestion {
    sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Deserialize)]
struct RecordUnknownQuestionArgs {
    question: String,
}

#[async_trait]
impl Tool for RecordUnknownQuestion {
    fn name(&self) -> &'static str {
        "record_unknown_question"
    }

    fn definition(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name().to_string(),
                description: Some(
                    "Always use this tool to record any question that couldn't be answered as \
                     you didn't know the answer"
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question that couldn't be answered"
                        }
                    },
                    "required": ["question"],
                    "additionalProperties": false
                })),
                strict: None,
            },
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, AppError> {
        let args: RecordUnknownQuestionArgs = serde_json::from_value(arguments).map_err(|err| {
            AppError::Validation(format!("record_unknown_question arguments: {err}"))
        })?;

        if let Err(err) = self
            .sink
            .notify(&format!("Recording {}", args.question))
            .await
        {
            warn!(error = %err, "unknown-question notification delivery failed");
        }

        Ok(json!({"recorded": "ok"}))
    }
}
