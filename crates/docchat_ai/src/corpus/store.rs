use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::chunking::ChunkDraft;
use super::model::{DocumentChunk, DocumentChunkSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceChunksResult {
    pub document_id: String,
    pub chunk_ids: Vec<String>,
}

/// On-disk chunk store: one JSON file per chunk plus a document-to-chunks
/// mapping. Rebuilding a document's chunks replaces that document's entries
/// and leaves every other document untouched.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    fn chunks_by_document_path(&self) -> PathBuf {
        self.root.join("chunks_by_document.json")
    }

    fn chunk_path(&self, chunk_id: &str) -> PathBuf {
        self.chunks_dir().join(format!("{chunk_id}.json"))
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.chunks_dir()).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to create chunk store directory")
                .with_details(format!("path={}; err={}", self.chunks_dir().display(), e))
        })
    }

    fn read_chunks_by_document(&self) -> Result<BTreeMap<String, Vec<String>>, AppError> {
        let path = self.chunks_by_document_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to read chunks_by_document mapping")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to decode chunks_by_document mapping")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    fn write_chunks_by_document(&self, map: &BTreeMap<String, Vec<String>>) -> Result<(), AppError> {
        let path = self.chunks_by_document_path();
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(map).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to encode chunks_by_document mapping")
                .with_details(e.to_string())
        })?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to write chunks_by_document mapping")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::new(
                "CORPUS_STORE_FAILED",
                "Failed to finalize chunks_by_document mapping write",
            )
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })?;
        Ok(())
    }

    fn write_chunk(&self, chunk: &DocumentChunk) -> Result<(), AppError> {
        let path = self.chunk_path(&chunk.chunk_id);
        let json = serde_json::to_string_pretty(chunk).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to encode chunk")
                .with_details(e.to_string())
        })?;
        fs::write(&path, json.as_bytes()).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to write chunk")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Ok(())
    }

    pub fn get_chunk(&self, chunk_id: &str) -> Result<DocumentChunk, AppError> {
        self.ensure_dirs()?;
        let path = self.chunk_path(chunk_id);
        let raw = fs::read_to_string(&path).map_err(|e| {
            AppError::new("CORPUS_CHUNK_NOT_FOUND", "Chunk not found")
                .with_details(format!("id={chunk_id}; err={e}"))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to decode chunk")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Persist freshly built chunks for one document, dropping whatever that
    /// document had before. Other documents' chunks are never touched.
    ///
    /// The previous version's chunk files stay on disk so an index that still
    /// references them keeps resolving; callers run `remove_orphan_files` once
    /// the index has been rebuilt against the new mapping.
    pub fn replace_document_chunks(
        &self,
        document_id: &str,
        filename: &str,
        drafts: Vec<ChunkDraft>,
    ) -> Result<ReplaceChunksResult, AppError> {
        self.ensure_dirs()?;

        if drafts.is_empty() {
            return Err(AppError::new(
                "CORPUS_EMPTY",
                "Document produced no chunks",
            )
            .with_details(format!("document_id={document_id}")));
        }

        let mut map = self.read_chunks_by_document()?;

        let mut chunk_ids = Vec::new();
        for d in drafts {
            let chunk = chunk_from_draft(document_id, filename, d);
            self.write_chunk(&chunk)?;
            chunk_ids.push(chunk.chunk_id);
        }
        map.insert(document_id.to_string(), chunk_ids.clone());
        self.write_chunks_by_document(&map)?;

        Ok(ReplaceChunksResult {
            document_id: document_id.to_string(),
            chunk_ids,
        })
    }

    /// Delete chunk files no document mapping references anymore. Safe to run
    /// only after the index has been rebuilt, since stale vectors may still
    /// point at the orphaned files.
    pub fn remove_orphan_files(&self) -> Result<(), AppError> {
        self.ensure_dirs()?;
        let map = self.read_chunks_by_document()?;
        let live: BTreeSet<String> = map.values().flatten().cloned().collect();

        let entries = fs::read_dir(self.chunks_dir()).map_err(|e| {
            AppError::new("CORPUS_STORE_FAILED", "Failed to list chunk store directory")
                .with_details(format!("path={}; err={}", self.chunks_dir().display(), e))
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                AppError::new("CORPUS_STORE_FAILED", "Failed to read chunk store entry")
                    .with_details(e.to_string())
            })?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let is_live = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| live.contains(stem));
            if is_live {
                continue;
            }
            fs::remove_file(&path).map_err(|e| {
                AppError::new("CORPUS_STORE_FAILED", "Failed to delete orphaned chunk file")
                    .with_details(format!("path={}; err={}", path.display(), e))
            })?;
        }
        Ok(())
    }

    /// Summaries for every stored chunk, in stable order:
    /// document_id asc, ordinal asc, chunk_id asc.
    pub fn list_chunks(&self) -> Result<Vec<DocumentChunkSummary>, AppError> {
        self.ensure_dirs()?;
        let map = self.read_chunks_by_document()?;

        let mut out: Vec<DocumentChunkSummary> = Vec::new();
        for ids in map.values() {
            for cid in ids {
                out.push(self.get_chunk(cid)?.summary());
            }
        }
        out.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.ordinal.cmp(&b.ordinal))
                .then(a.chunk_id.cmp(&b.chunk_id))
        });
        Ok(out)
    }
}

fn chunk_from_draft(document_id: &str, filename: &str, d: ChunkDraft) -> DocumentChunk {
    let text = normalize_text(&d.text);
    let text_sha256 = sha256_hex(text.as_bytes());
    let id_input = format!("v1|{}|{}|{}", document_id, d.ordinal, text_sha256);
    let chunk_id = sha256_hex(id_input.as_bytes());

    DocumentChunk {
        chunk_id,
        document_id: document_id.to_string(),
        filename: filename.to_string(),
        ordinal: d.ordinal,
        char_count: text.chars().count() as u32,
        text,
        text_sha256,
    }
}

pub(crate) fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
