pub mod corpus;
pub mod ranking;

pub use corpus::{chunk_text, CorpusChunk, CorpusStore, CHUNK_MAX_CHARS};
pub use ranking::{cosine_similarity, retrieve, DEFAULT_TOP_K};
