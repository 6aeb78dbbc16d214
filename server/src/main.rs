use std::net::SocketAddr;
use std::sync::Arc;

use docchat_ai::embeddings::ollama_embed::OllamaEmbedder;
use docchat_ai::llm::ollama_llm::OllamaLlm;
use docchat_ai::ollama::OllamaClient;

use docchat_server::config::ServerConfig;
use docchat_server::routes;
use docchat_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    let client = OllamaClient::new(&config.ollama_url)?;

    let embedder = Arc::new(OllamaEmbedder::new(client.clone()));
    let llm = Arc::new(OllamaLlm::new(client.clone()));
    let state = AppState::new(config.clone(), embedder, llm, Some(client))?;

    let app = routes::router(state);

    let addr: SocketAddr = config.addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("docchat listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
