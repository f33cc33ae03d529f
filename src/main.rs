mod error;
mod llm;
mod routes;
mod services;
mod state;

use std::sync::Arc;
use std::time::Duration;

use services::codegen::CodeGenerator;
use services::orchestrator::Orchestrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into());

    let config = llm::config::LlmConfig::from_env().expect("invalid LLM configuration");
    if !config.has_api_key() {
        // Not fatal: generations fail at the provider and the chat reports it.
        tracing::warn!(var = %config.api_key_var, "LLM credential not set; generations will fail");
    }
    let tuning = config.tuning;
    let deadline = Duration::from_secs(config.timeouts.request_secs);

    let client = llm::LlmClient::from_config(config).expect("LLM client init failed");
    let model = client.model().to_string();
    tracing::info!(%model, "LLM client initialized");

    let generator = CodeGenerator::new(Arc::new(client))
        .with_tuning(tuning)
        .with_deadline(deadline);
    let state = state::AppState::new(Orchestrator::new(generator), &model);

    // Re-render the preview on every new document.
    let _preview = services::preview::spawn_preview_task(state.orchestrator.subscribe(), state.preview.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("{bind_addr}:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "helbulid listening");
    axum::serve(listener, app).await.expect("server failed");
}
