//! Local feature-hashing embedder
//!
//! Deterministic and offline. Vectors are persisted next to the memories
//! they describe, so the feature hash must stay stable across builds and
//! platforms; it is derived from SHA-256 rather than `std`'s randomized
//! or release-dependent hashers.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::embedding::{EmbedTask, Embedder};
use crate::error::Result;

/// Weight applied to adjacent-word features relative to single words
const BIGRAM_WEIGHT: f32 = 0.5;

/// Hashed bag-of-words embedder with log-scaled term frequency
pub struct TfIdfEmbedder {
    dimensions: usize,
}

/// Where a feature lands in the vector, and with which sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    index: usize,
    negative: bool,
}

impl Slot {
    fn of(feature: &str, dimensions: usize) -> Self {
        let digest = Sha256::digest(feature.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);

        Self {
            index: (u64::from_le_bytes(head) % dimensions as u64) as usize,
            negative: digest[8] & 1 == 1,
        }
    }

    fn signed(self, weight: f32) -> f32 {
        if self.negative {
            -weight
        } else {
            weight
        }
    }
}

impl TfIdfEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Lowercased alphanumeric words, single characters dropped
    fn words(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1)
            .map(String::from)
            .collect()
    }

    /// Weighted features for one text: words then adjacent word pairs
    fn features(words: &[String]) -> Vec<(String, f32)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in words {
            *counts.entry(word.as_str()).or_default() += 1;
        }

        let total = words.len() as f32;
        let mut features: Vec<(String, f32)> = counts
            .into_iter()
            .map(|(word, count)| {
                let tf = (1.0 + count as f32 / total).ln();
                // Longer words are rarer in practice; stand-in for corpus IDF
                let idf = 1.0 + word.chars().count() as f32 * 0.1;
                (word.to_string(), tf * idf)
            })
            .collect();

        features.extend(
            words
                .windows(2)
                .map(|pair| (format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT)),
        );
        features
    }
}

impl Embedder for TfIdfEmbedder {
    fn embed(&self, text: &str, _task: EmbedTask) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0_f32; self.dimensions];

        for (feature, weight) in Self::features(&Self::words(text)) {
            let slot = Slot::of(&feature, self.dimensions);
            embedding[slot.index] += slot.signed(weight);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "tfidf"
    }
}
