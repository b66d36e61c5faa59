//! In-memory vector index.
//!
//! Holds the chunks of one upload batch together with their embedding
//! vectors. Retrieval is brute-force cosine similarity over all stored
//! vectors; at the scale of a handful of uploaded PDFs this is well under
//! a millisecond and needs no approximate-nearest-neighbor structure.
//!
//! An index is immutable once built. The service replaces the whole index
//! on every upload rather than updating it in place.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chunk::Chunk;
use crate::embedding::cosine_similarity;

#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dims: usize,
    document_count: usize,
    built_at: DateTime<Utc>,
}

/// A retrieval hit: a stored chunk and its similarity to the query.
pub struct Scored<'a> {
    pub score: f32,
    pub chunk: &'a Chunk,
}

/// Summary of the current index, exposed via `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub chunk_count: usize,
    pub document_count: usize,
    pub dims: usize,
    pub built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Build an index from chunks and their vectors (parallel slices).
    ///
    /// Fails on an empty batch, a chunk/vector count mismatch, or vectors
    /// of inconsistent dimensionality.
    pub fn build(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        document_count: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            bail!("cannot build an index from zero chunks");
        }
        if chunks.len() != vectors.len() {
            bail!(
                "chunk count ({}) does not match vector count ({})",
                chunks.len(),
                vectors.len()
            );
        }

        let dims = vectors[0].len();
        if dims == 0 {
            bail!("embedding vectors are empty");
        }
        for v in &vectors {
            if v.len() != dims {
                bail!("vector dimension mismatch: expected {}, got {}", dims, v.len());
            }
        }

        Ok(Self {
            chunks,
            vectors,
            dims,
            document_count,
            built_at: Utc::now(),
        })
    }

    /// Return the `k` stored chunks most similar to `query`, best first.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Vec<Scored<'_>> {
        let mut scored: Vec<Scored<'_>> = self
            .chunks
            .iter()
            .zip(self.vectors.iter())
            .map(|(chunk, vector)| Scored {
                score: cosine_similarity(query, vector),
                chunk,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            chunk_count: self.chunks.len(),
            document_count: self.document_count,
            dims: self.dims,
            built_at: self.built_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_text;

    fn chunks_for(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .flat_map(|t| chunk_text(t, 1000, 200))
            .collect()
    }

    #[test]
    fn build_rejects_empty_batch() {
        assert!(VectorIndex::build(Vec::new(), Vec::new(), 0).is_err());
    }

    #[test]
    fn build_rejects_count_mismatch() {
        let chunks = chunks_for(&["one", "two"]);
        let err = VectorIndex::build(chunks, vec![vec![1.0, 0.0]], 1).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn build_rejects_dimension_mismatch() {
        let chunks = chunks_for(&["one", "two"]);
        let err =
            VectorIndex::build(chunks, vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]], 1).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn retrieve_orders_by_similarity() {
        let chunks = chunks_for(&["north", "east", "up"]);
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let index = VectorIndex::build(chunks, vectors, 3).unwrap();

        let hits = index.retrieve(&[0.9, 0.1, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "north");
        assert_eq!(hits[1].chunk.text, "east");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn retrieve_caps_at_stored_count() {
        let chunks = chunks_for(&["only"]);
        let index = VectorIndex::build(chunks, vec![vec![1.0, 0.0]], 1).unwrap();
        assert_eq!(index.retrieve(&[1.0, 0.0], 10).len(), 1);
    }

    #[test]
    fn stats_reflect_build() {
        let chunks = chunks_for(&["a", "b", "c"]);
        let vectors = vec![vec![1.0, 0.0]; 3];
        let index = VectorIndex::build(chunks, vectors, 2).unwrap();
        let stats = index.stats();
        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.dims, 2);
    }
}
