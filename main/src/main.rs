use std::{path::Path, sync::Arc};

use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use conversation_engine::{
    ChatTurn, ConversationEngine, ConversationState, DisabledSink, EngineOptions,
    NotificationSink, OpenAiChatBackend, Persona, PushoverSink, ToolDispatcher,
    GENERIC_FAILURE_REPLY,
};
use retrieval_pipeline::CorpusStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );
    db.ensure_initialized().await?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(EmbeddingProvider::from_config(
        &config,
        openai_client.clone(),
    ));
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    // The corpus and persona documents are produced offline; both load once.
    let data_dir = Path::new(&config.data_dir);
    let persona = Persona::load(data_dir, &config.persona_name)?;
    let corpus = Arc::new(CorpusStore::load(data_dir, &persona.combined_documents())?);
    info!(chunks = corpus.len(), "Corpus loaded");

    let sink: Arc<dyn NotificationSink> =
        match (config.pushover_token.clone(), config.pushover_user.clone()) {
            (Some(token), Some(user)) => Arc::new(PushoverSink::new(token, user)),
            _ => {
                info!("No pushover credentials configured, notifications disabled");
                Arc::new(DisabledSink)
            }
        };
    let dispatcher = Arc::new(ToolDispatcher::with_builtin_tools(sink));

    let backend = Arc::new(OpenAiChatBackend::new(
        openai_client,
        config.chat_model.clone(),
    ));

    let engine = ConversationEngine::new(
        db,
        backend,
        embedding_provider,
        corpus,
        dispatcher,
        persona,
        EngineOptions::from_config(&config),
    );

    run_chat_loop(&engine).await
}

/// Minimal line-oriented front end. The real UI is an external collaborator;
/// this loop exists so the agent can be driven end-to-end from a terminal.
async fn run_chat_loop(engine: &ConversationEngine) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = ConversationState::default();
    let mut history: Vec<ChatTurn> = Vec::new();

    println!("Ask a question (ctrl-d to quit):");
    while let Some(line) = lines.next_line().await? {
        let message = line.trim().to_string();
        if message.is_empty() {
            continue;
        }

        match engine.answer(&message, &history, &mut state).await {
            Ok(answer) => {
                println!("{answer}\n");
                history.push(ChatTurn::user(message));
                history.push(ChatTurn::assistant(answer));
            }
            Err(err) => {
                // The visitor gets one generic line; detail goes to the log.
                error!(error = %err, "conversation turn failed");
                println!("{GENERIC_FAILURE_REPLY}\n");
            }
        }
    }

    Ok(())
}
