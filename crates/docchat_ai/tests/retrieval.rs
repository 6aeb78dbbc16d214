use docchat_ai::corpus::chunking::chunk_text;
use docchat_ai::corpus::{ChunkStore, IndexStore};
use docchat_ai::embeddings::Embedder;
use docchat_ai::retrieve::query_with_embedder;
use docchat_core::error::AppError;

struct CountABEmbedder;

impl Embedder for CountABEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let mut a = 0u32;
        let mut b = 0u32;
        for ch in input.chars() {
            if ch == 'a' {
                a += 1;
            } else if ch == 'b' {
                b += 1;
            }
        }
        Ok(vec![a as f32, b as f32])
    }
}

#[test]
fn retrieval_returns_stable_topk_and_tie_breaks_by_chunk_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chunks = ChunkStore::open(dir.path().to_path_buf());
    let index = IndexStore::open(dir.path().to_path_buf());

    chunks
        .replace_document_chunks("doc-a", "a.pdf", chunk_text(&"a".repeat(250), 300, 30))
        .expect("doc a");
    chunks
        .replace_document_chunks("doc-b", "b.pdf", chunk_text(&"b".repeat(250), 300, 30))
        .expect("doc b");
    index
        .build_with_embedder(&chunks, &CountABEmbedder, "mock", "2026-02-10T00:00:00Z")
        .expect("build");

    // Query biased toward 'a' should rank the 'a' chunk first.
    let hits = query_with_embedder(&chunks, &index, &CountABEmbedder, "aaaa", 2).expect("query");
    assert_eq!(hits.len(), 2);
    assert!(hits[0].text.starts_with('a'));
    assert!(hits[1].text.starts_with('b'));
    assert_eq!(hits[0].filename, "a.pdf");

    // Tie query should order by chunk_id asc as a deterministic tie-breaker.
    let tie = query_with_embedder(&chunks, &index, &CountABEmbedder, "ab", 2).expect("tie");
    assert_eq!(tie.len(), 2);
    assert!(tie[0].chunk_id < tie[1].chunk_id);
}

#[test]
fn first_document_survives_second_upload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chunks = ChunkStore::open(dir.path().to_path_buf());
    let index = IndexStore::open(dir.path().to_path_buf());

    chunks
        .replace_document_chunks("doc-a", "a.pdf", chunk_text(&"a".repeat(200), 300, 30))
        .expect("doc a");
    index
        .build_with_embedder(&chunks, &CountABEmbedder, "mock", "2026-02-10T00:00:00Z")
        .expect("build 1");

    chunks
        .replace_document_chunks("doc-b", "b.pdf", chunk_text(&"b".repeat(200), 300, 30))
        .expect("doc b");
    index
        .build_with_embedder(&chunks, &CountABEmbedder, "mock", "2026-02-10T01:00:00Z")
        .expect("build 2");

    // Content unique to the first upload is still retrievable.
    let hits = query_with_embedder(&chunks, &index, &CountABEmbedder, "aaaa", 1).expect("query");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document_id, "doc-a");
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _model: &str, _input: &str) -> Result<Vec<f32>, AppError> {
        Err(AppError::new("AI_EMBEDDINGS_FAILED", "embedding backend down").with_retryable(true))
    }
}

#[test]
fn failed_reembed_keeps_previous_corpus_queryable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chunks = ChunkStore::open(dir.path().to_path_buf());
    let index = IndexStore::open(dir.path().to_path_buf());

    chunks
        .replace_document_chunks("doc-a", "a.pdf", chunk_text(&"a".repeat(200), 300, 30))
        .expect("doc a v1");
    index
        .build_with_embedder(&chunks, &CountABEmbedder, "mock", "2026-02-10T00:00:00Z")
        .expect("build v1");
    let v1_hits =
        query_with_embedder(&chunks, &index, &CountABEmbedder, "aaaa", 1).expect("query v1");
    assert_eq!(v1_hits.len(), 1);

    // Re-upload with different content while the embedding backend is down.
    chunks
        .replace_document_chunks("doc-a", "a.pdf", chunk_text(&"b".repeat(200), 300, 30))
        .expect("doc a v2");
    let err = index
        .build_with_embedder(&chunks, &FailingEmbedder, "mock", "2026-02-10T01:00:00Z")
        .unwrap_err();
    assert_eq!(err.code, "AI_EMBEDDINGS_FAILED");

    // The index still points at v1 chunks; those must still resolve.
    let hits = query_with_embedder(&chunks, &index, &CountABEmbedder, "aaaa", 1)
        .expect("query after failed re-embed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, v1_hits[0].text);

    // Once embeddings come back, the next build converges on v2.
    index
        .build_with_embedder(&chunks, &CountABEmbedder, "mock", "2026-02-10T02:00:00Z")
        .expect("build v2");
    let hits = query_with_embedder(&chunks, &index, &CountABEmbedder, "bbbb", 1).expect("query v2");
    assert!(hits[0].text.starts_with('b'));
}

#[test]
fn query_before_any_upload_reports_index_not_ready() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chunks = ChunkStore::open(dir.path().to_path_buf());
    let index = IndexStore::open(dir.path().to_path_buf());

    let err = query_with_embedder(&chunks, &index, &CountABEmbedder, "anything", 4).unwrap_err();
    assert_eq!(err.code, "INDEX_NOT_READY");
    assert_eq!(err.message, "No documents uploaded yet.");
}

#[test]
fn empty_query_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chunks = ChunkStore::open(dir.path().to_path_buf());
    let index = IndexStore::open(dir.path().to_path_buf());

    let err = query_with_embedder(&chunks, &index, &CountABEmbedder, "   ", 4).unwrap_err();
    assert_eq!(err.code, "RETRIEVAL_FAILED");
}

#[test]
fn top_k_is_clamped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chunks = ChunkStore::open(dir.path().to_path_buf());
    let index = IndexStore::open(dir.path().to_path_buf());

    chunks
        .replace_document_chunks("doc-a", "a.pdf", chunk_text(&"a b ".repeat(300), 300, 30))
        .expect("doc a");
    index
        .build_with_embedder(&chunks, &CountABEmbedder, "mock", "2026-02-10T00:00:00Z")
        .expect("build");

    // top_k = 0 is lifted to 1.
    let hits = query_with_embedder(&chunks, &index, &CountABEmbedder, "a", 0).expect("query");
    assert_eq!(hits.len(), 1);
}
