//! The answer pipeline.
//!
//! Given a question and the current [`VectorIndex`], embeds the question,
//! retrieves the most similar chunks, and asks the language model to
//! answer from that context alone. The instructional template is the only
//! thing keeping the model on-context; its output is returned untouched,
//! with no validation, no citations, and no retry beyond the HTTP
//! client's own.

use anyhow::Result;

use crate::config::Config;
use crate::embedding;
use crate::index::{Scored, VectorIndex};
use crate::llm;

/// Answer `question` against `index` and return the model's raw text.
pub async fn answer(config: &Config, index: &VectorIndex, question: &str) -> Result<String> {
    let query = embedding::embed_query(&config.embedding, question).await?;
    let hits = index.retrieve(&query, config.retrieval.top_k);
    let context = format_context(&hits);
    let prompt = build_prompt(&context, question);

    tracing::debug!(
        retrieved = hits.len(),
        prompt_bytes = prompt.len(),
        "invoking language model"
    );

    llm::generate(&config.llm, &prompt).await
}

/// Join retrieved chunk texts into the context block, best hit first.
pub fn format_context(hits: &[Scored<'_>]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Substitute the fixed instructional template. The wording constrains the
/// model to the supplied context and tells it to say when the answer is
/// not there.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert assistant for explaining legal documents. \
         Use only the context provided to answer the question.\n\
         If the context doesn't contain the answer, state clearly that the \
         information is not found. Be concise and helpful.\n\n\
         Context: {context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}
