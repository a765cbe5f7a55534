// Embeddings and schema similarity search

pub mod embedder;
pub mod schema_docs;
pub mod vector_search;

pub use embedder::*;
pub use schema_docs::*;
pub use vector_search::*;
