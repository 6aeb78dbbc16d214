use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::corpus::{ChunkStore, IndexStore};
use crate::embeddings::Embedder;

mod similarity;

pub const DEFAULT_TOP_K: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub ordinal: u32,
    pub score: f32,
    pub text: String,
}

/// Exhaustive cosine scan over the stored vectors, top-k by score with a
/// deterministic tie-break on chunk_id.
pub fn query_with_embedder(
    chunks: &ChunkStore,
    index: &IndexStore,
    embedder: &dyn Embedder,
    query: &str,
    top_k: u32,
) -> Result<Vec<RetrievedChunk>, AppError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::new("RETRIEVAL_FAILED", "Query must not be empty"));
    }
    let top_k = top_k.max(1).min(50);

    let st = index.status()?;
    if !st.ready {
        return Err(AppError::new(
            "INDEX_NOT_READY",
            "No documents uploaded yet.",
        ));
    }
    let model = st
        .model
        .clone()
        .ok_or_else(|| AppError::new("INDEX_NOT_READY", "Index status missing model"))?;
    let dims = st
        .dims
        .ok_or_else(|| AppError::new("INDEX_NOT_READY", "Index status missing dims"))?;

    let qv = embedder.embed(&model, q)?;
    if qv.len() as u32 != dims {
        return Err(AppError::new(
            "RETRIEVAL_FAILED",
            "Query embedding dims do not match index dims",
        )
        .with_details(format!("index_dims={dims}; query_dims={}", qv.len())));
    }

    let vectors = index.read_vectors()?;
    if vectors.is_empty() {
        return Err(AppError::new(
            "INDEX_NOT_READY",
            "Index vectors missing; re-upload a document",
        ));
    }

    let qnorm = similarity::l2_norm(&qv);
    if qnorm == 0.0 {
        return Err(AppError::new("RETRIEVAL_FAILED", "Query embedding norm is zero"));
    }

    let mut hits: Vec<(String, f32)> = Vec::new();
    for (chunk_id, v) in vectors.iter() {
        if v.len() as u32 != dims {
            return Err(AppError::new("RETRIEVAL_FAILED", "Index vector dims mismatch")
                .with_details(format!("chunk_id={chunk_id}; expected={dims}; got={}", v.len())));
        }
        let vnorm = similarity::l2_norm(v);
        if vnorm == 0.0 {
            continue;
        }
        let score = similarity::cosine_similarity(&qv, v, qnorm, vnorm);
        hits.push((chunk_id.clone(), score));
    }

    hits.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    hits.truncate(top_k as usize);

    let mut out: Vec<RetrievedChunk> = Vec::new();
    for (chunk_id, score) in hits {
        let chunk = chunks.get_chunk(&chunk_id)?;
        out.push(RetrievedChunk {
            chunk_id: chunk.chunk_id,
            document_id: chunk.document_id,
            filename: chunk.filename,
            ordinal: chunk.ordinal,
            score,
            text: chunk.text,
        });
    }
    Ok(out)
}
