//! Embedding-based similarity search
//!
//! The index degrades rather than fails: with no usable backend every search
//! returns `Error::EmbeddingUnavailable`, which callers treat as "no semantic
//! results".

pub mod backend;
pub mod index;

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use backend::{DisabledBackend, EmbeddingBackend, FastEmbedBackend, HashingBackend};
pub use index::{EmbeddingIndex, SimilarMatch, StaleEmbedding};

/// Which backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Fastembed,
    Hashing,
    Disabled,
}

impl FromStr for BackendKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "fastembed" | "model" => Ok(BackendKind::Fastembed),
            "hashing" | "hash" => Ok(BackendKind::Hashing),
            "disabled" | "none" | "off" => Ok(BackendKind::Disabled),
            _ => Err(crate::Error::Config(format!("Unknown embedding backend: {}", s))),
        }
    }
}

/// Build a backend; a model that fails to load becomes `DisabledBackend`
pub fn load_backend(kind: BackendKind, show_download_progress: bool) -> Arc<dyn EmbeddingBackend> {
    match kind {
        BackendKind::Fastembed => match FastEmbedBackend::try_new(show_download_progress) {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                warn!("semantic search disabled: {}", e);
                Arc::new(DisabledBackend::new(e.to_string()))
            }
        },
        BackendKind::Hashing => Arc::new(HashingBackend::default()),
        BackendKind::Disabled => Arc::new(DisabledBackend::new("disabled in config")),
    }
}

/// Cosine similarity; 0.0 for empty, zero or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("hashing".parse::<BackendKind>().unwrap(), BackendKind::Hashing);
        assert_eq!("OFF".parse::<BackendKind>().unwrap(), BackendKind::Disabled);
        assert!("gpu".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_load_disabled_backend() {
        let backend = load_backend(BackendKind::Disabled, false);
        assert!(!backend.available());
    }
}
