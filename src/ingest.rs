//! Upload ingestion pipeline.
//!
//! Coordinates the full upload flow: PDF extraction → concatenation →
//! chunking → batched embedding → index construction. All-or-nothing: any
//! failure aborts the upload and leaves the previously installed index
//! untouched.

use anyhow::{anyhow, bail, Result};

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding;
use crate::extract;
use crate::index::VectorIndex;

/// One file from the upload form.
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Extract, chunk, and embed `files` into a fresh [`VectorIndex`].
///
/// Text from all files is concatenated in upload order; per-document
/// boundaries do not survive past this point. The error message names the
/// offending file when extraction fails.
pub async fn build_index(config: &Config, files: &[UploadedFile]) -> Result<VectorIndex> {
    let mut combined = String::new();
    for file in files {
        let text =
            extract::pdf_text(&file.bytes).map_err(|e| anyhow!("{}: {}", file.name, e))?;
        combined.push_str(&text);
    }

    let chunks = chunk_text(
        &combined,
        config.chunking.chunk_size,
        config.chunking.overlap,
    );
    if chunks.is_empty() {
        bail!("documents contained no extractable text");
    }

    tracing::info!(
        documents = files.len(),
        text_bytes = combined.len(),
        chunks = chunks.len(),
        "embedding upload batch"
    );

    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(config.embedding.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let mut batch_vectors = embedding::embed_texts(&config.embedding, &texts).await?;
        vectors.append(&mut batch_vectors);
    }

    VectorIndex::build(chunks, vectors, files.len())
}
