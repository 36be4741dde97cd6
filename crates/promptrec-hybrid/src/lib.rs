//! promptrec-hybrid
//!
//! Ties the keyword and vector rankers together behind [`Recommender`],
//! which exposes one entry point per mode plus typed outcomes that keep
//! "nothing matched" apart from "the vector path failed".

pub mod fuse;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use promptrec_core::config::{RecommendSettings, Settings};
use promptrec_core::traits::Embedder;
use promptrec_core::types::{Prompt, RecommendMode, RecommendOutcome, ScoredCandidate};
use promptrec_text::{KeywordRanker, TagExtractor};
use promptrec_vector::{EmbeddingIndex, IndexOptions, VectorRanker};

pub use fuse::{FusionWeights, HybridFuser};

pub struct Recommender {
    extractor: TagExtractor,
    keyword: KeywordRanker,
    vector: VectorRanker,
    fuser: HybridFuser,
    settings: RecommendSettings,
}

impl Recommender {
    pub fn new(extractor: TagExtractor, index: Arc<EmbeddingIndex>, settings: RecommendSettings) -> Self {
        Self {
            extractor,
            keyword: KeywordRanker::new(),
            vector: VectorRanker::new(index),
            fuser: HybridFuser::new(FusionWeights::from(&settings)),
            settings,
        }
    }

    /// Wire everything from loaded settings. Relative paths resolve
    /// against `base`.
    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>, base: &Path) -> Self {
        let index = EmbeddingIndex::new(embedder, IndexOptions::from_settings(settings, base));
        Self::new(TagExtractor::new(settings.categories.clone()), Arc::new(index), settings.recommend.clone())
    }

    pub fn extractor(&self) -> &TagExtractor { &self.extractor }

    pub fn index(&self) -> &Arc<EmbeddingIndex> { self.vector.index() }

    pub fn settings(&self) -> &RecommendSettings { &self.settings }

    pub fn keyword_recommend(&self, text: &str, prompts: &[Prompt], top_k: usize) -> Vec<ScoredCandidate> {
        let tags = self.extractor.extract(text);
        debug!(categories = ?tags.categories, keywords = ?tags.keywords, "extracted tags");
        self.keyword.rank(&tags, prompts, top_k)
    }

    pub fn vector_recommend(&self, text: &str, prompts: &[Prompt], top_k: usize) -> Vec<ScoredCandidate> {
        self.vector.rank(text, prompts, top_k)
    }

    pub fn hybrid_recommend(&self, text: &str, prompts: &[Prompt], top_k: usize) -> Vec<ScoredCandidate> {
        self.recommend(RecommendMode::Hybrid, text, prompts, top_k).into_candidates()
    }

    pub fn recommend(&self, mode: RecommendMode, text: &str, prompts: &[Prompt], top_k: usize) -> RecommendOutcome {
        match mode {
            RecommendMode::Keyword => RecommendOutcome::Results(self.keyword_recommend(text, prompts, top_k)),
            RecommendMode::Vector => match self.vector.try_rank(text, prompts, top_k) {
                Ok(results) => RecommendOutcome::Results(results),
                Err(e) => {
                    warn!(error = %e, "vector recommendation unavailable");
                    RecommendOutcome::Unavailable { reason: e.to_string() }
                }
            },
            RecommendMode::Hybrid => {
                let pool = self.candidate_pool(top_k);
                let keyword = self.keyword_recommend(text, prompts, pool);
                match self.vector.try_rank(text, prompts, pool) {
                    Ok(vector) => RecommendOutcome::Results(self.fuser.fuse(&keyword, &vector, top_k)),
                    Err(e) => self.degrade(&keyword, top_k, e.to_string()),
                }
            }
        }
    }

    /// Hybrid recommendation that waits at most `timeout` for the vector
    /// side (index build plus query embedding). That work runs on a
    /// blocking thread and keeps going after a timeout, so a later call can
    /// still pick up the built index.
    pub async fn hybrid_recommend_within(&self, text: &str, prompts: &[Prompt], top_k: usize, timeout: Duration) -> RecommendOutcome {
        let pool = self.candidate_pool(top_k);
        let vector = self.vector.clone();
        let owned_text = text.to_string();
        let owned = prompts.to_vec();
        let task = tokio::task::spawn_blocking(move || vector.try_rank(&owned_text, &owned, pool));

        let keyword = self.keyword_recommend(text, prompts, pool);
        let reason = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(vector))) => return RecommendOutcome::Results(self.fuser.fuse(&keyword, &vector, top_k)),
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(join)) => format!("vector ranking task failed: {join}"),
            Err(_) => format!("vector ranking exceeded {} ms", timeout.as_millis()),
        };
        self.degrade(&keyword, top_k, reason)
    }

    /// Drop the cached vector index. Call after prompts are added or edited.
    pub fn invalidate_index(&self) {
        self.vector.index().invalidate();
    }

    fn candidate_pool(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.settings.candidate_factor.max(1))
    }

    fn degrade(&self, keyword: &[ScoredCandidate], top_k: usize, reason: String) -> RecommendOutcome {
        warn!(reason = %reason, "hybrid recommendation falling back to keyword ranking");
        RecommendOutcome::Degraded { results: self.fuser.fuse(keyword, &[], top_k), reason }
    }
}
