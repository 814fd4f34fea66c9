//! Embedding generation.
//!
//! Prism consumes embeddings; it does not compute them. An [`Embedder`] is the
//! provider seam. [`embed_in_chunks`] batches provider calls and
//! [`DocumentEmbedder`] turns raw document text into embedded [`Document`]s
//! ready for insertion.
//!
//! [`Document`]: crate::data::Document

pub mod batch;
pub mod document;
pub mod embedder;

pub use batch::embed_in_chunks;
pub use document::{DocumentEmbedder, DocumentInput};
pub use embedder::Embedder;
