//! Keyword retrieval for Conductor.
//!
//! [`KeywordIndex`] is an in-process implementation of the
//! [`conductor_core::Retriever`] port, ranking documents with BM25. It serves
//! as the RAG agent's index source when no external retrieval service is
//! configured.

/// BM25 scoring over an inverted index.
pub mod bm25;
/// Document store and retrieval port implementation.
pub mod keyword;

pub use bm25::Bm25;
pub use keyword::KeywordIndex;
