//! Embedding backends
//!
//! - `FastEmbedBackend`: local AllMiniLML6V2 model (384 dimensions)
//! - `HashingBackend`: deterministic feature hashing, no model download
//! - `DisabledBackend`: always unavailable

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::{Error, Result};

pub const DEFAULT_DIMENSION: usize = 384;

/// Turns text into fixed-length vectors.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Length of every vector this backend produces
    fn dimension(&self) -> usize;

    /// Whether `encode` can be called at all
    fn available(&self) -> bool;

    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Local transformer model via fastembed
pub struct FastEmbedBackend {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedBackend {
    /// Load the default model, downloading it on first use
    pub fn try_new(show_download_progress: bool) -> Result<Self> {
        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(show_download_progress);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::EmbeddingUnavailable(format!("Failed to load embedding model: {}", e)))?;

        Ok(Self { model: Mutex::new(model) })
    }
}

impl EmbeddingBackend for FastEmbedBackend {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    fn dimension(&self) -> usize {
        DEFAULT_DIMENSION
    }

    fn available(&self) -> bool {
        true
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode_batch(&[text.to_string()])?;
        if vectors.is_empty() {
            return Err(Error::Embedding("model returned no vector".to_string()));
        }
        Ok(vectors.remove(0))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(format!("Embedding generation failed: {}", e)))
    }
}

/// Signed feature hashing over words and character trigrams.
///
/// Texts sharing words or word fragments get a positive cosine; vectors are
/// L2-normalized. Scores run lower than a trained model's, so thresholds
/// around 0.3 suit it better than the model default of 0.5.
pub struct HashingBackend {
    dimension: usize,
}

impl HashingBackend {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = blake3::hash(feature.as_bytes());
        let bytes = hash.as_bytes();
        let mut head = [0u8; 8];
        head.copy_from_slice(&bytes[..8]);
        let value = u64::from_le_bytes(head);

        let index = (value % self.dimension as u64) as usize;
        let sign = if value >> 63 == 1 { -1.0 } else { 1.0 };
        vector[index] += sign * weight;
    }
}

impl Default for HashingBackend {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbeddingBackend for HashingBackend {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn available(&self) -> bool {
        true
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();

        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.add_feature(&mut vector, &format!("w:{}", word), 1.0);

            let padded: Vec<char> = format!("^{}$", word).chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                self.add_feature(&mut vector, &format!("t:{}", trigram), 0.5);
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        Ok(vector)
    }
}

/// Backend that never encodes; analysis degrades to exact and graph results
pub struct DisabledBackend {
    reason: String,
}

impl DisabledBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl EmbeddingBackend for DisabledBackend {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn dimension(&self) -> usize {
        0
    }

    fn available(&self) -> bool {
        false
    }

    fn encode(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::EmbeddingUnavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_hashing_is_deterministic_and_normalized() {
        let backend = HashingBackend::default();
        let a = backend.encode("JWT Authentication Discussion").unwrap();
        let b = backend.encode("JWT Authentication Discussion").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSION);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_hashing_similarity_follows_shared_words() {
        let backend = HashingBackend::default();
        let query = backend.encode("authentication tokens").unwrap();
        let related = backend.encode("JWT Authentication Discussion").unwrap();
        let unrelated = backend.encode("Lunch order for Friday").unwrap();

        let related_score = cosine_similarity(&query, &related);
        let unrelated_score = cosine_similarity(&query, &unrelated);
        assert!(related_score > 0.4, "related score {}", related_score);
        assert!(related_score > unrelated_score + 0.2);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let backend = HashingBackend::new(16);
        let v = backend.encode("  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_disabled_backend() {
        let backend = DisabledBackend::new("no model");
        assert!(!backend.available());
        let err = backend.encode("hello").unwrap_err();
        assert!(err.is_degradable());
    }
}
