use std::sync::Arc;

use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{qa_entry::QaEntry, session::Session, unknown_question::UnknownQuestion},
    },
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use retrieval_pipeline::{CorpusStore, DEFAULT_TOP_K};

use crate::{
    llm::{ChatBackend, ModelTurn},
    persona::Persona,
    prompt::system_prompt,
    tools::ToolDispatcher,
};

/// Reserved message that switches the caller's session to the admin
/// identifier. Matched trimmed and case-insensitively.
pub const ADMIN_COMMAND: &str = "/admin";
pub const ADMIN_CONFIRMATION: &str = "Admin mode enabled for this session.";

/// What the UI shows when a turn fails for any reason other than the rate
/// limit. Internal detail stays in the logs.
pub const GENERIC_FAILURE_REPLY: &str =
    "Something went wrong on my end. Please try asking that again.";

/// Final answers containing either marker are treated as "could not answer"
/// and appended to the unknown-question log.
const UNANSWERED_MARKERS: [&str; 2] = ["I don't know", "Sorry"];

/// Opaque token the UI threads through calls. Only the engine writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior turn of the visitor-facing transcript, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub admin_session_id: String,
    pub max_questions: u32,
}

impl EngineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            admin_session_id: config.admin_session_id.clone(),
            max_questions: config.max_questions,
        }
    }
}

/// Orchestrates one visitor question end-to-end: admin override, rate gate,
/// answer cache, retrieval, and the tool-calling model loop.
pub struct ConversationEngine {
    db: Arc<SurrealDbClient>,
    backend: Arc<dyn ChatBackend>,
    embedding: Arc<EmbeddingProvider>,
    corpus: Arc<CorpusStore>,
    dispatcher: Arc<ToolDispatcher>,
    persona: Persona,
    options: EngineOptions,
}

impl ConversationEngine {
    pub fn new(
        db: Arc<SurrealDbClient>,
        backend: Arc<dyn ChatBackend>,
        embedding: Arc<EmbeddingProvider>,
        corpus: Arc<CorpusStore>,
        dispatcher: Arc<ToolDispatcher>,
        persona: Persona,
        options: EngineOptions,
    ) -> Self {
        Self {
            db,
            backend,
            embedding,
            corpus,
            dispatcher,
            persona,
            options,
        }
    }

    /// Answers one visitor message. `history` is the prior transcript as the
    /// UI shows it; `state` is mutated in place (session minting, admin
    /// override). Errors from the embedding or model backend surface to the
    /// caller; state already persisted stays committed.
    pub async fn answer(
        &self,
        message: &str,
        history: &[ChatTurn],
        state: &mut ConversationState,
    ) -> Result<String, AppError> {
        if message.trim().eq_ignore_ascii_case(ADMIN_COMMAND) {
            state.session_id = Some(self.options.admin_session_id.clone());
            return Ok(ADMIN_CONFIRMATION.to_string());
        }

        let session_id = match &state.session_id {
            Some(session_id) => session_id.clone(),
            None => {
                let session_id = Uuid::new_v4().to_string();
                Session::create(&session_id, &self.db).await?;
                state.session_id = Some(session_id.clone());
                session_id
            }
        };

        // Rate gate. A storage failure here propagates; the limit is never
        // skipped on a failed read.
        if session_id != self.options.admin_session_id {
            let session = match Session::get(&session_id, &self.db).await? {
                Some(session) => session,
                None => Session::create(&session_id, &self.db).await?,
            };
            if session.questions_asked >= self.options.max_questions {
                debug!(%session_id, "question limit reached");
                return Ok(self.limit_message());
            }
            Session::increment_questions(&session_id, &self.db).await?;
        }

        // Answer cache. A failed read degrades to a miss.
        match QaEntry::find_answer(message, &self.db).await {
            Ok(Some(answer)) => {
                debug!(%session_id, "answer cache hit");
                return Ok(answer);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "answer cache lookup failed, treating as miss");
            }
        }

        let query_vector = self.embedding.embed(message).await?;
        let context = self.corpus.context_for(&query_vector, DEFAULT_TOP_K);

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
        let system = ChatCompletionRequestSystemMessage::from(system_prompt(&self.persona, &context));
        messages.push(system.into());
        for turn in history {
            messages.push(request_message(turn)?);
        }
        messages.push(ChatCompletionRequestUserMessage::from(message).into());

        let tools = self.dispatcher.catalog();

        // Ask, maybe run tools, ask again. Exits on the first turn that
        // carries no tool calls.
        let final_answer = loop {
            let turn = self
                .backend
                .complete(messages.clone(), tools.clone())
                .await?;

            match turn {
                ModelTurn::ToolCalls(tool_calls) => {
                    let assistant_turn = ChatCompletionRequestAssistantMessageArgs::default()
                        .tool_calls(tool_calls.clone())
                        .build()?;
                    messages.push(assistant_turn.into());

                    for call in &tool_calls {
                        let outcome = self.dispatcher.dispatch(call).await;
                        let tool_turn = ChatCompletionRequestToolMessageArgs::default()
                            .content(outcome.content.to_string())
                            .tool_call_id(outcome.tool_call_id)
                            .build()?;
                        messages.push(tool_turn.into());
                    }
                }
                ModelTurn::Content(content) => break content,
            }
        };

        // The answer is already computed; cache/log failures must not
        // invalidate it.
        if let Err(err) = QaEntry::upsert(message, &final_answer, &self.db).await {
            warn!(error = %err, "failed to cache answer");
        }
        if UNANSWERED_MARKERS
            .iter()
            .any(|marker| final_answer.contains(marker))
        {
            if let Err(err) = UnknownQuestion::log(message, &self.db).await {
                warn!(error = %err, "failed to log unknown question");
            }
        }

        Ok(final_answer)
    }

    fn limit_message(&self) -> String {
        format!(
            "You have reached the {}-question limit.",
            self.options.max_questions
        )
    }
}

fn request_message(turn: &ChatTurn) -> Result<ChatCompletionRequestMessage, AppError> {
    Ok(match turn.role {
        ChatRole::User => ChatCompletionRequestUserMessage::from(turn.content.as_str()).into(),
        ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(turn.content.clone())
            .build()?
            .into(),
    })
}
