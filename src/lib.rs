// Lexrag - legal case-law search connectors for a RAG research backend

pub mod config;
pub mod search;    // Search targets (CourtListener connector + dispatch)
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use search::{OpinionRecord, SearchError, SearchTarget, SEARCH_TARGETS};
