use std::fs;
use std::sync::{Arc, Mutex, RwLock};

use docchat_ai::answer::generate_answer;
use docchat_ai::corpus::chunking::chunk_text;
use docchat_ai::corpus::{ChunkStore, IndexStore};
use docchat_ai::embeddings::Embedder;
use docchat_ai::extract::extract_pdf_text;
use docchat_ai::llm::Llm;
use docchat_ai::ollama::OllamaClient;
use docchat_ai::retrieve::query_with_embedder;
use docchat_core::db;
use docchat_core::documents::{
    document_id_for_filename, list_documents, upsert_document, DocumentRecord,
};
use docchat_core::error::AppError;
use docchat_core::storage::{sanitize_filename, UploadStore};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    registry: Mutex<rusqlite::Connection>,
    uploads: UploadStore,
    pub chunks: ChunkStore,
    pub index: IndexStore,
    // Single-writer guard over the chunk store and index. Uploads take the
    // write half; retrieval takes the read half. On-disk writes are
    // tmp-then-rename, so a reader never observes a half-written file.
    index_lock: RwLock<()>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn Llm>,
    ollama: Option<OllamaClient>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn Llm>,
        ollama: Option<OllamaClient>,
    ) -> Result<Arc<Self>, AppError> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            AppError::new("DATA_DIR_FAILED", "Failed to create data directory")
                .with_details(format!("path={}; err={}", config.data_dir.display(), e))
        })?;

        let db_path = config.data_dir.join("docchat.sqlite");
        let mut conn = db::open(&db_path)?;
        db::migrate(&mut conn)?;

        Ok(Arc::new(Self {
            uploads: UploadStore::open(config.data_dir.join("uploads")),
            chunks: ChunkStore::open(config.data_dir.clone()),
            index: IndexStore::open(config.data_dir.clone()),
            config,
            registry: Mutex::new(conn),
            index_lock: RwLock::new(()),
            embedder,
            llm,
            ollama,
        }))
    }

    /// Full upload pipeline: persist, extract, chunk, register, re-embed.
    /// Runs as the single writer so concurrent uploads cannot interleave
    /// their load-merge-save cycles.
    pub fn process_upload(&self, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let name = sanitize_filename(filename)?;
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(AppError::new("UPLOAD_INVALID", "Only PDF uploads are supported")
                .with_details(format!("filename={name}")));
        }
        if bytes.is_empty() {
            return Err(AppError::new("UPLOAD_INVALID", "Uploaded file is empty"));
        }

        let _guard = self
            .index_lock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.uploads.save(&name, bytes)?;
        let text = extract_pdf_text(bytes)?;
        let drafts = chunk_text(&text, self.config.chunk_chars, self.config.chunk_overlap);

        let document_id = document_id_for_filename(&name);
        let replaced = self.chunks.replace_document_chunks(&document_id, &name, drafts)?;

        let uploaded_at = now_rfc3339_utc()?;
        {
            let conn = self
                .registry
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            upsert_document(
                &conn,
                &DocumentRecord {
                    document_id,
                    filename: name.clone(),
                    byte_len: bytes.len() as u64,
                    chunk_count: replaced.chunk_ids.len() as u32,
                    uploaded_at: uploaded_at.clone(),
                },
            )?;
        }

        self.index.build_with_embedder(
            &self.chunks,
            self.embedder.as_ref(),
            &self.config.embed_model,
            &uploaded_at,
        )?;

        // Old chunk files outlive the replace so a failed re-embed above keeps
        // the previous index answerable. Drop them only now.
        self.chunks.remove_orphan_files()?;

        Ok(name)
    }

    /// One retrieval + generation round-trip. Retrieval holds the read half
    /// of the index lock; generation runs after it is released.
    pub fn answer_query(&self, query: &str) -> Result<String, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("QUERY_INVALID", "Query must not be empty"));
        }

        let hits = {
            let _guard = self
                .index_lock
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            query_with_embedder(
                &self.chunks,
                &self.index,
                self.embedder.as_ref(),
                q,
                self.config.top_k,
            )?
        };

        generate_answer(self.llm.as_ref(), &self.config.llm_model, q, &hits)
    }

    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>, AppError> {
        let conn = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        list_documents(&conn)
    }

    pub fn ollama_health(&self) -> Result<(), AppError> {
        match self.ollama.as_ref() {
            Some(client) => client.health_check(),
            None => Ok(()),
        }
    }
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::new("TIME_FORMAT_FAILED", "Failed to format time").with_details(e.to_string()))
}
