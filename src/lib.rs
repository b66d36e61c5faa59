//! # docqa
//!
//! A self-hosted question-answering service for PDF documents.
//!
//! Upload PDFs, then ask questions in natural language; answers are
//! generated by a local language model conditioned on the most similar
//! chunks of the uploaded text (retrieval-augmented generation). The
//! whole index lives in memory and is replaced wholesale on every upload;
//! nothing is persisted across restarts.
//!
//! ## Architecture
//!
//! ```text
//! POST /api/upload ──▶ extract ──▶ chunk ──▶ embed ──▶ VectorIndex
//!                                                          │ (replaces)
//! POST /api/ask ──▶ embed query ──▶ retrieve top-k ──▶ prompt ──▶ LLM
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ollama pull nomic-embed-text
//! ollama pull tinyllama
//! docqa check                   # verify both models are available
//! docqa serve                   # http://localhost:7860
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF text extraction |
//! | [`chunk`] | Overlapping text chunking |
//! | [`embedding`] | Embedding clients (Ollama, OpenAI) |
//! | [`index`] | In-memory vector index |
//! | [`llm`] | Language-model clients (Ollama, OpenAI) |
//! | [`pipeline`] | Retrieval + prompt + generation |
//! | [`ingest`] | Upload orchestration |
//! | [`server`] | HTTP surface |
//! | [`check`] | Backend connectivity probe |

pub mod check;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod server;
