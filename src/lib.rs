//! Retrieval-augmented question answering over social-media posts.
//!
//! A query is embedded, matched against a vector index, reranked with a
//! cross-encoder and answered by a language model constrained to the retrieved
//! posts. See [`rag::RagService`] for the end-to-end entry point.

pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod eval;
pub mod index;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;


pub use config::AppConfig;
pub use errors::*;
