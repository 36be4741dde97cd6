use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use promptrec_core::config::{optional_path, FingerprintMode, Settings};
use promptrec_core::error::{Error, Result};
use promptrec_core::traits::Embedder;
use promptrec_core::types::{Prompt, PromptId};

use crate::backend::l2_normalize;
use crate::cache;
use crate::fingerprint::Fingerprint;
use crate::snapshot::VectorIndexSnapshot;

pub type IndexHandle = Arc<VectorIndexSnapshot>;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub fingerprint: FingerprintMode,
    pub cache_path: Option<PathBuf>,
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self { fingerprint: FingerprintMode::Identity, cache_path: None, batch_size: 32, show_progress: false }
    }
}

impl IndexOptions {
    /// Options from settings; a relative `cache_path` resolves against `base`.
    pub fn from_settings(settings: &Settings, base: &std::path::Path) -> Self {
        Self {
            fingerprint: settings.index.fingerprint,
            cache_path: optional_path(base, &settings.index.cache_path),
            batch_size: settings.embedding.batch_size.max(1),
            show_progress: settings.index.show_progress,
        }
    }
}

/// Cached vector index over a prompt collection.
///
/// Holds at most one snapshot. `ensure_built` validates it against the
/// collection fingerprint under a read lock and rebuilds under the write
/// lock; queries run on the immutable `Arc` without holding the lock, so a
/// reader never sees a half-built index.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    options: IndexOptions,
    state: RwLock<Option<IndexHandle>>,
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>, options: IndexOptions) -> Self {
        Self { embedder, options, state: RwLock::new(None) }
    }

    /// The snapshot currently held, valid or not for any given collection.
    pub fn current(&self) -> Option<IndexHandle> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn ensure_built(&self, prompts: &[Prompt]) -> Result<IndexHandle> {
        let fp = Fingerprint::of(prompts, self.options.fingerprint);
        let embedder_id = self.embedder.embedder_id();
        {
            let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(h) = guard.as_ref().filter(|h| h.matches(&fp, embedder_id)) {
                debug!(fingerprint = %fp, "vector index cache hit");
                return Ok(Arc::clone(h));
            }
        }

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // another caller may have rebuilt while we waited
        if let Some(h) = guard.as_ref().filter(|h| h.matches(&fp, embedder_id)) {
            return Ok(Arc::clone(h));
        }
        if let Some(stale) = guard.take() {
            info!(old = %stale.fingerprint(), new = %fp, "prompt collection changed, rebuilding vector index");
        }

        let snapshot = match self.load_cached(&fp) {
            Some(s) => s,
            None => {
                let s = self.build(prompts, fp)?;
                self.store_cached(&s);
                s
            }
        };
        let handle = Arc::new(snapshot);
        *guard = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Query the held snapshot. Empty when nothing has been built.
    pub fn query(&self, query_text: &str, top_k: usize) -> Result<Vec<(PromptId, f32)>> {
        match self.current() {
            Some(h) => self.query_snapshot(&h, query_text, top_k),
            None => Ok(Vec::new()),
        }
    }

    pub fn query_snapshot(&self, snapshot: &VectorIndexSnapshot, query_text: &str, top_k: usize) -> Result<Vec<(PromptId, f32)>> {
        if snapshot.is_empty() || top_k == 0 || query_text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut q = self.embed_one(query_text)?;
        l2_normalize(&mut q);
        Ok(snapshot.search(&q, top_k))
    }

    /// Drop the held snapshot and the on-disk copy. Call after the prompt
    /// collection is edited in ways the fingerprint cannot see.
    pub fn invalidate(&self) {
        // keep the lock until the file is gone so a concurrent build cannot
        // reload the old snapshot from disk
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.take();
        if let Some(path) = &self.options.cache_path {
            match cache::remove(path) {
                Ok(()) => info!(path = %path.display(), "vector index cache invalidated"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove vector index cache"),
            }
        }
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embedder.embed_batch(&[text.to_string()]).map_err(Error::embedding)?;
        let v = out.pop().ok_or_else(|| Error::EmbeddingUnavailable("embedder returned no vector".into()))?;
        self.check_dim(&v)?;
        Ok(v)
    }

    fn check_dim(&self, v: &[f32]) -> Result<()> {
        if v.len() != self.embedder.dim() {
            return Err(Error::EmbeddingUnavailable(format!("dim mismatch: got {} expected {}", v.len(), self.embedder.dim())));
        }
        Ok(())
    }

    fn build(&self, prompts: &[Prompt], fingerprint: Fingerprint) -> Result<VectorIndexSnapshot> {
        let start = Instant::now();
        // one row per id; the first prompt with a given id wins
        let mut seen = HashSet::with_capacity(prompts.len());
        let mut unique: Vec<&Prompt> = Vec::with_capacity(prompts.len());
        for p in prompts {
            if seen.insert(p.id.as_str()) {
                unique.push(p);
            }
        }
        if unique.len() < prompts.len() {
            warn!(skipped = prompts.len() - unique.len(), "duplicate prompt ids skipped while indexing");
        }
        let ids: Vec<PromptId> = unique.iter().map(|p| p.id.clone()).collect();
        let texts: Vec<String> = unique.iter().map(|p| p.indexed_text()).collect();
        let pb = if self.options.show_progress { ProgressBar::new(texts.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} prompts {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.options.batch_size.max(1)) {
            let embs = self.embedder.embed_batch(batch).map_err(Error::embedding)?;
            if embs.len() != batch.len() {
                return Err(Error::EmbeddingUnavailable(format!("embedder returned {} vectors for {} texts", embs.len(), batch.len())));
            }
            for mut v in embs {
                self.check_dim(&v)?;
                l2_normalize(&mut v);
                vectors.push(v);
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        let snapshot = VectorIndexSnapshot::from_parts(fingerprint, self.embedder.embedder_id(), self.embedder.dim(), ids, vectors)?;
        info!(prompts = snapshot.len(), ms = start.elapsed().as_millis() as u64, "vector index built");
        Ok(snapshot)
    }

    fn load_cached(&self, fingerprint: &Fingerprint) -> Option<VectorIndexSnapshot> {
        let path = self.options.cache_path.as_ref()?;
        match cache::load(path, fingerprint, self.embedder.embedder_id(), self.embedder.dim()) {
            Ok(Some(s)) => {
                info!(path = %path.display(), prompts = s.len(), "vector index loaded from disk cache");
                Some(s)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load vector index cache");
                None
            }
        }
    }

    fn store_cached(&self, snapshot: &VectorIndexSnapshot) {
        let Some(path) = self.options.cache_path.as_ref() else { return };
        if snapshot.is_empty() { return; }
        if let Err(e) = cache::save(path, snapshot) {
            warn!(path = %path.display(), error = %e, "failed to save vector index cache");
        }
    }
}
