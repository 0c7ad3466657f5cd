// Feature-hashing encoder: an offline, model-free TextEncoder.
//
// Lowercase word tokens and adjacent-word bigrams are hashed with SHA-256 into
// a fixed number of buckets; the first digest bytes pick the bucket and the
// next byte picks the sign. Texts that share vocabulary get high cosine
// similarity. It has none of the semantic reach of the sentence model but is
// fully deterministic across platforms and runs without downloads.

use anyhow::Result;
use async_trait::async_trait;
use regex_lite::Regex;
use sha2::{Digest, Sha256};

use super::traits::TextEncoder;

/// Default vector length for the hashing encoder.
pub const DEFAULT_HASHING_DIM: usize = 256;

pub struct HashingEncoder {
    dim: usize,
    token_re: Regex,
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            token_re: Regex::new(r"[a-z0-9]+").expect("valid token regex"),
        }
    }

    /// Encode a single text. Bigrams get half the weight of unigrams.
    pub fn encode_one(&self, text: &str) -> Vec<f64> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = self.token_re.find_iter(&lower).map(|m| m.as_str()).collect();

        let mut vector = vec![0.0_f64; self.dim];
        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f64], feature: &str, weight: f64) {
        let digest = Sha256::digest(feature.as_bytes());
        let bucket = u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]) as usize
            % self.dim;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl TextEncoder for HashingEncoder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::similarity::cosine_similarity;

    #[test]
    fn test_same_text_same_vector() {
        let enc = HashingEncoder::default();
        let a = enc.encode_one("How often do you use UPI?");
        let b = enc.encode_one("How often do you use UPI?");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_HASHING_DIM);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let enc = HashingEncoder::default();
        let a = enc.encode_one("Credit score, matters!");
        let b = enc.encode_one("credit SCORE matters");
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_vocabulary_is_more_similar() {
        let enc = HashingEncoder::default();
        let a = enc.encode_one("how do you repay your home loan");
        let b = enc.encode_one("how do you repay your car loan");
        let c = enc.encode_one("favourite stock market index");
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let enc = HashingEncoder::new(8);
        assert!(enc.encode_one("").iter().all(|&v| v == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let enc = HashingEncoder::default();
        let texts = vec!["alpha beta".to_string(), "gamma".to_string()];
        let out = enc.encode_batch(&texts).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], enc.encode_one("gamma"));
    }
}
