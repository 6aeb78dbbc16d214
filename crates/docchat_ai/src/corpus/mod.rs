pub mod chunking;
pub mod index;
pub mod model;
pub mod store;

pub use index::{IndexStatus, IndexStore};
pub use model::{DocumentChunk, DocumentChunkSummary};
pub use store::{ChunkStore, ReplaceChunksResult};
