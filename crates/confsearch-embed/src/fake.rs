use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use twox_hash::XxHash64;

use confsearch_core::text::TextBudget;
use confsearch_core::traits::EmbeddingClient;
use confsearch_core::types::Conference;
use confsearch_core::Result;

/// Token-hashing embedder: deterministic, L2-normalized, no I/O.
/// Counts `embed_one` calls so callers can assert on embedding traffic.
pub struct FakeEmbedder {
    dim: usize,
    budget: TextBudget,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), budget: TextBudget::default(), calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn with_budget(mut self, budget: TextBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, conferences: &[Conference]) -> Result<Vec<Conference>> {
        crate::embed_each(self, &self.budget, conferences).await
    }
}
