//! # Contextual - Context Analysis & Entity Linking Engine
//!
//! Turns an arbitrary span of selected text into a ranked, explainable set of
//! matches against a personal knowledge base, and decides at save time which
//! contacts a new snippet is linked to.
//!
//! Contextual provides:
//! - Priority-ordered pattern classification (ticket ids, emails, urls, ...)
//! - Person name extraction and contact scoring
//! - Substring lookup and one-hop knowledge graph expansion
//! - Embedding-based similarity search that degrades when unavailable
//! - Explicit-vs-automatic contact linking with a strict precedence rule

pub mod entity;
pub mod edge;
pub mod storage;
pub mod pattern;
pub mod matching;
pub mod graph;
pub mod embedding;
pub mod analyzer;
pub mod linker;
pub mod watcher;
pub mod server;
pub mod ui;
pub mod config;

// Re-exports for convenient access
pub use entity::{Abbreviation, Contact, EntityKind, EntityRecord, EntityRef, Project, Snippet};
pub use edge::{Direction, RelationshipEdge, RelationshipKind};
pub use storage::{SqliteStore, StoreHandle};
pub use pattern::{Classifier, PatternKind, RegexClassifier};
pub use embedding::{EmbeddingBackend, EmbeddingIndex};
pub use analyzer::{AnalysisResult, ContextSynthesizer};
pub use linker::{EntityLinker, LinkMode, LinkReport};

/// Result type alias for Contextual operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Contextual operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid entity reference: {0}")]
    InvalidEntity(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("'{name}' matches {} contacts equally well", candidates.len())]
    AmbiguousLink { name: String, candidates: Vec<i64> },

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityRef),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Errors after which analysis continues with a smaller result set
    pub fn is_degradable(&self) -> bool {
        matches!(self, Error::EmbeddingUnavailable(_) | Error::Embedding(_))
    }
}
