use std::path::PathBuf;

use docchat_ai::corpus::chunking::{DEFAULT_CHUNK_CHARS, DEFAULT_CHUNK_OVERLAP};
use docchat_ai::retrieve::DEFAULT_TOP_K;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub data_dir: PathBuf,
    pub ollama_url: String,
    pub llm_model: String,
    pub embed_model: String,
    pub top_k: u32,
    pub chunk_chars: usize,
    pub chunk_overlap: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            addr: env_or("DOCCHAT_ADDR", "127.0.0.1:8000"),
            data_dir: PathBuf::from(env_or("DOCCHAT_DATA_DIR", "data")),
            ollama_url: env_or("DOCCHAT_OLLAMA_URL", "http://127.0.0.1:11434"),
            llm_model: env_or("DOCCHAT_LLM_MODEL", "llama3"),
            embed_model: env_or("DOCCHAT_EMBED_MODEL", "nomic-embed-text"),
            top_k: std::env::var("DOCCHAT_TOP_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOP_K),
            chunk_chars: DEFAULT_CHUNK_CHARS,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}
