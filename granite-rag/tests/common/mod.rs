//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use granite_rag::{
    Completion, Conversation, EmbeddingProvider, GenerationOptions, RagError, Result,
    TextGenerator,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bag-of-words embedder: each lowercase word increments a hashed bucket,
/// then the vector is L2-normalized. Identical texts embed identically.
#[derive(Debug)]
pub struct HashingEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedder that returns vectors one element too short.
#[derive(Debug, Default)]
pub struct MisshapenEmbedder;

#[async_trait]
impl EmbeddingProvider for MisshapenEmbedder {
    fn name(&self) -> &str {
        "misshapen"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.5; 7])
    }

    fn dimensions(&self) -> usize {
        8
    }
}

const VOCAB: [&str; 16] = [
    "music", "video", "channel", "launched", "cable", "network", "television", "youth",
    "culture", "1981", "programs", "reality", "awards", "broadcast", "artists", "news",
];

/// Seeded pseudo-model. Output depends only on the seed and the prompt, and
/// every conversation it sees is recorded.
#[derive(Debug, Default)]
pub struct SeededGenerator {
    seen: Mutex<Vec<Conversation>>,
}

impl SeededGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for SeededGenerator {
    fn name(&self) -> &str {
        "seeded-fake"
    }

    async fn generate(
        &self,
        conversation: &Conversation,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.seen.lock().unwrap().push(conversation.clone());

        let prompt = conversation.last_user_content().unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        let seed = options.seed.unwrap_or_else(rand::random) ^ hasher.finish();
        let mut rng = StdRng::seed_from_u64(seed);

        let count = options.max_new_tokens.min(12);
        let words: Vec<&str> = (0..count).map(|_| VOCAB[rng.gen_range(0..VOCAB.len())]).collect();

        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok(Completion {
            text: words.join(" "),
            prompt_tokens: prompt.split_whitespace().count(),
            completion_tokens: count,
        })
    }
}

/// Generator that always fails, like a model that ran out of memory.
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(
        &self,
        _conversation: &Conversation,
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        Err(RagError::GenerationError {
            backend: "failing".to_string(),
            message: "out of memory".to_string(),
        })
    }
}
