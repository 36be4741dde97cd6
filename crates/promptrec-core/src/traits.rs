use crate::types::Prompt;

/// Text embedding provider.
///
/// Given the same `embedder_id` and input text an implementation must
/// return the same vector. Vectors of one provider all have `dim()` entries.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `fake:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Source of the prompt collection. Absence is an empty collection, not
/// an error.
pub trait PromptStore: Send + Sync {
    fn load_prompts(&self) -> anyhow::Result<Vec<Prompt>>;
}

/// In-memory nearest-neighbour structure over inner product.
pub trait VectorBackend: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Append vectors; their positions continue from the current `len()`.
    fn add(&mut self, vectors: &[Vec<f32>]) -> anyhow::Result<()>;
    /// Top `k` positions by inner product, best first.
    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)>;
}
