//! Offline feature-hashing encoder
//!
//! Each lowercase alphanumeric token is hashed with SHA-256 into one signed bucket,
//! and the bucket counts are L2-normalized. No model download, no network, and the
//! output depends only on the text and the dimension.

use async_trait::async_trait;
use sha2::Digest;
use sha2::Sha256;

use super::Encoder;
use crate::errors::PostRagError;
use crate::errors::Result;

pub struct HashingEncoder {
    dimension: usize,
    model: String,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "hashing encoder dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model: format!("feature-hashing-{dimension}"),
        })
    }

    /// Synchronous embedding, used by the [`Encoder`] impl
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Encoder for HashingEncoder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
