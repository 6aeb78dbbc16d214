use serde::{Deserialize, Serialize};

/// The unit of retrieval: a bounded span of extracted document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub ordinal: u32,
    pub text: String,
    pub text_sha256: String,
    pub char_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunkSummary {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub ordinal: u32,
    pub text_sha256: String,
    pub char_count: u32,
}

impl DocumentChunk {
    pub fn summary(&self) -> DocumentChunkSummary {
        DocumentChunkSummary {
            chunk_id: self.chunk_id.clone(),
            document_id: self.document_id.clone(),
            filename: self.filename.clone(),
            ordinal: self.ordinal,
            text_sha256: self.text_sha256.clone(),
            char_count: self.char_count,
        }
    }
}
