use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;

use super::store::ChunkStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub updated_at: Option<String>,
}

impl IndexStatus {
    fn empty() -> Self {
        Self {
            ready: false,
            model: None,
            dims: None,
            chunk_count: 0,
            updated_at: None,
        }
    }
}

/// Persistent embedding index over the whole chunk store. Vectors and text
/// hashes live in JSON maps keyed by chunk_id; every write is tmp-then-rename
/// so readers always see a complete file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    fn status_path(&self) -> PathBuf {
        self.index_dir().join("index_status.json")
    }

    fn vectors_path(&self) -> PathBuf {
        self.index_dir().join("index_vectors.json")
    }

    fn hashes_path(&self) -> PathBuf {
        self.index_dir().join("index_hashes.json")
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.index_dir()).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.index_dir().display(), e))
        })
    }

    pub fn status(&self) -> Result<IndexStatus, AppError> {
        self.ensure_dirs()?;
        let path = self.status_path();
        if !path.exists() {
            return Ok(IndexStatus::empty());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to read index status")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to decode index status")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    fn write_json_atomic<T: Serialize>(&self, path: PathBuf, value: &T, what: &str) -> Result<(), AppError> {
        self.ensure_dirs()?;
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(value).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", format!("Failed to encode {what}"))
                .with_details(e.to_string())
        })?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", format!("Failed to write {what}"))
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", format!("Failed to finalize {what} write"))
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })?;
        Ok(())
    }

    pub fn read_vectors(&self) -> Result<BTreeMap<String, Vec<f32>>, AppError> {
        self.ensure_dirs()?;
        let path = self.vectors_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to read index vectors")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to decode index vectors")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    pub fn read_hashes(&self) -> Result<BTreeMap<String, String>, AppError> {
        self.ensure_dirs()?;
        let path = self.hashes_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to read index hashes")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to decode index hashes")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Bring the index in line with the chunk store: embed chunks whose text
    /// is new or changed, drop vectors for chunks that no longer exist, keep
    /// everything else. The result is the union of all uploaded documents.
    pub fn build_with_embedder(
        &self,
        chunks: &ChunkStore,
        embedder: &dyn Embedder,
        model: &str,
        updated_at: &str,
    ) -> Result<IndexStatus, AppError> {
        self.ensure_dirs()?;

        let summaries = chunks.list_chunks()?;
        if summaries.is_empty() {
            return Err(AppError::new(
                "INDEX_NOT_READY",
                "No chunks available; upload a document before building the index",
            ));
        }

        let current = self.status()?;
        let compatible = current.ready && current.model.as_deref() == Some(model);

        let mut vectors: BTreeMap<String, Vec<f32>> = if compatible {
            self.read_vectors()?
        } else {
            BTreeMap::new()
        };
        let mut hashes: BTreeMap<String, String> = if compatible {
            self.read_hashes()?
        } else {
            BTreeMap::new()
        };

        // Prune vectors/hashes for chunks no longer present.
        let wanted: BTreeSet<String> = summaries.iter().map(|s| s.chunk_id.clone()).collect();
        vectors.retain(|k, _| wanted.contains(k));
        hashes.retain(|k, _| wanted.contains(k));

        let mut to_embed: Vec<String> = Vec::new();
        for s in summaries.iter() {
            let existing_hash = hashes.get(&s.chunk_id);
            let has_vec = vectors.contains_key(&s.chunk_id);
            if existing_hash != Some(&s.text_sha256) || !has_vec {
                to_embed.push(s.chunk_id.clone());
            }
        }
        to_embed.sort();
        to_embed.dedup();

        let mut dims: Option<u32> = if compatible { current.dims } else { None };

        for chunk_id in to_embed.iter() {
            let chunk = chunks.get_chunk(chunk_id)?;
            let v = embedder.embed(model, &chunk.text).map_err(|e| {
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to compute embeddings")
                    .with_details(format!("chunk_id={}; err={}", chunk_id, e))
                    .with_retryable(e.retryable)
            })?;
            let this_dims = v.len() as u32;
            if let Some(d) = dims {
                if d != this_dims {
                    return Err(AppError::new(
                        "INDEX_BUILD_FAILED",
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!("expected={}; got={}; chunk_id={}", d, this_dims, chunk_id)));
                }
            } else {
                dims = Some(this_dims);
            }
            vectors.insert(chunk_id.clone(), v);
        }

        for s in summaries.iter() {
            hashes.insert(s.chunk_id.clone(), s.text_sha256.clone());
        }

        // Persist only after all embeddings succeed.
        self.write_json_atomic(self.vectors_path(), &vectors, "index vectors")?;
        self.write_json_atomic(self.hashes_path(), &hashes, "index hashes")?;

        let status = IndexStatus {
            ready: true,
            model: Some(model.to_string()),
            dims,
            chunk_count: vectors.len() as u32,
            updated_at: Some(updated_at.to_string()),
        };
        self.write_json_atomic(self.status_path(), &status, "index status")?;
        Ok(status)
    }
}
