//! Core data types that flow through the ingestion and retrieval
//! pipeline.

use serde::{Deserialize, Serialize};

/// Positional and provenance metadata attached to every chunk.
///
/// The full struct, including the chunk's own text, is stored as the
/// vector record payload, so retrieval can render context without a
/// second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source filename the chunk was cut from.
    pub source: String,
    /// 0-based position in split order, contiguous per source.
    pub chunk_index: usize,
    /// Target chunk size (characters) used when splitting.
    pub chunk_size: usize,
    /// Overlap (characters) used when splitting.
    pub chunk_overlap: usize,
    /// The chunk text, duplicated here for downstream rendering.
    pub text: String,
}

/// A bounded substring of a cleaned document.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// One record upserted to the external vector index.
///
/// The id is `"{source}_{chunk_index}"`; the index owns the record
/// after upsert and this system holds no independent copy.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A retrieved record with its similarity score in `[0, 1]`
/// (higher = more similar). Transient, discarded once the response
/// is formed.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub score: f32,
    pub metadata: ChunkMetadata,
}
