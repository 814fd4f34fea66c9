//! Document persistence on top of the similarity backend.

pub mod document;

pub use document::DocumentStore;
