use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use promptrec_core::config::FingerprintMode;
use promptrec_core::error::Error;
use promptrec_core::traits::Embedder;
use promptrec_core::types::Prompt;
use promptrec_embed::FakeEmbedder;
use promptrec_vector::{EmbeddingIndex, IndexOptions};

/// Fake embedder that counts provider calls.
struct CountingEmbedder {
    inner: FakeEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Arc<Self> { Arc::new(Self { inner: FakeEmbedder::new(128), calls: AtomicUsize::new(0) }) }
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl Embedder for CountingEmbedder {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embedder_id(&self) -> &str { "failing" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 8 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { Err(anyhow!("model unavailable")) }
}

struct WrongDimEmbedder;

impl Embedder for WrongDimEmbedder {
    fn embedder_id(&self) -> &str { "wrong-dim" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 8 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|_| vec![1.0; 4]).collect()) }
}

fn prompts(n: usize) -> Vec<Prompt> {
    let topics = ["fastapi server api", "react ui form", "pandas csv chart", "docker deploy ci"];
    (0..n)
        .map(|i| Prompt::new(i.to_string(), format!("prompt {i}"), topics[i % topics.len()]).with_keywords([format!("k{i}")]))
        .collect()
}

fn options(batch_size: usize) -> IndexOptions {
    IndexOptions { batch_size, ..IndexOptions::default() }
}

#[test]
fn unchanged_collection_is_a_cache_hit() {
    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), options(2));
    let ps = prompts(5);

    let first = index.ensure_built(&ps).expect("build");
    assert_eq!(embedder.calls(), 3, "five prompts in batches of two");
    let second = index.ensure_built(&ps).expect("hit");
    assert_eq!(embedder.calls(), 3, "no provider call on a cache hit");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 5);
}

#[test]
fn count_change_forces_rebuild() {
    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), options(32));
    let before = index.ensure_built(&prompts(3)).expect("build");
    let after = index.ensure_built(&prompts(4)).expect("rebuild");
    assert_eq!(embedder.calls(), 2);
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.len(), 4);
    assert!(Arc::ptr_eq(&index.current().expect("held"), &after));
}

#[test]
fn identity_fingerprint_ignores_content_edits_but_content_mode_does_not() {
    let mut edited = prompts(3);
    edited[1].body = "completely different text".to_string();

    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), options(32));
    index.ensure_built(&prompts(3)).expect("build");
    index.ensure_built(&edited).expect("identity hit");
    assert_eq!(embedder.calls(), 1, "same ids and count reuse the stale index");

    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), IndexOptions { fingerprint: FingerprintMode::Content, ..options(32) });
    index.ensure_built(&prompts(3)).expect("build");
    index.ensure_built(&edited).expect("content rebuild");
    assert_eq!(embedder.calls(), 2);
}

#[test]
fn query_ranks_closest_prompt_first() {
    let index = EmbeddingIndex::new(CountingEmbedder::new(), options(32));
    let ps = prompts(4);
    index.ensure_built(&ps).expect("build");
    let hits = index.query("fastapi server", 2).expect("query");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0, "0");
    assert!(hits[0].1 >= hits[1].1);
    assert!(hits.iter().all(|(_, s)| (-1.0001..=1.0001).contains(s)));
}

#[test]
fn empty_collection_builds_without_provider_calls() {
    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), options(32));
    assert!(index.query("anything", 3).expect("no snapshot").is_empty());
    let snap = index.ensure_built(&[]).expect("empty build");
    assert!(snap.is_empty());
    assert!(index.query("anything", 3).expect("query").is_empty());
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn provider_failure_is_embedding_unavailable() {
    let index = EmbeddingIndex::new(Arc::new(FailingEmbedder), options(32));
    match index.ensure_built(&prompts(2)) {
        Err(Error::EmbeddingUnavailable(msg)) => assert!(msg.contains("model unavailable")),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(index.current().is_none(), "nothing is served after a failed build");

    let index = EmbeddingIndex::new(Arc::new(WrongDimEmbedder), options(32));
    assert!(matches!(index.ensure_built(&prompts(2)), Err(Error::EmbeddingUnavailable(_))));
}

#[test]
fn failed_rebuild_drops_stale_snapshot() {
    struct FlakyEmbedder { inner: FakeEmbedder, fail: std::sync::atomic::AtomicBool }
    impl Embedder for FlakyEmbedder {
        fn embedder_id(&self) -> &str { self.inner.embedder_id() }
        fn dim(&self) -> usize { self.inner.dim() }
        fn max_len(&self) -> usize { self.inner.max_len() }
        fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            if self.fail.load(Ordering::SeqCst) { return Err(anyhow!("offline")); }
            self.inner.embed_batch(texts)
        }
    }
    let embedder = Arc::new(FlakyEmbedder { inner: FakeEmbedder::new(32), fail: std::sync::atomic::AtomicBool::new(false) });
    let index = EmbeddingIndex::new(embedder.clone(), options(32));
    index.ensure_built(&prompts(2)).expect("build");
    embedder.fail.store(true, Ordering::SeqCst);
    assert!(index.ensure_built(&prompts(3)).is_err());
    assert!(index.current().is_none());
}

#[test]
fn disk_cache_is_reused_across_instances_and_invalidated() {
    let tmp = tempfile::tempdir().unwrap();
    let cache_path = tmp.path().join("cache/index.json");
    let opts = IndexOptions { cache_path: Some(cache_path.clone()), ..options(32) };
    let ps = prompts(3);

    let first = CountingEmbedder::new();
    EmbeddingIndex::new(first.clone(), opts.clone()).ensure_built(&ps).expect("build");
    assert_eq!(first.calls(), 1);
    assert!(cache_path.exists());

    let second = CountingEmbedder::new();
    let index = EmbeddingIndex::new(second.clone(), opts.clone());
    let snap = index.ensure_built(&ps).expect("load");
    assert_eq!(second.calls(), 0, "vectors come from disk");
    let v = snap.vector("0").expect("vector for id 0");
    assert_eq!(v.len(), 128);
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4, "stored vectors are unit norm, got {norm}");
    assert!(snap.vector("missing").is_none());
    assert_eq!(snap.ids(), &["0".to_string(), "1".to_string(), "2".to_string()]);

    index.invalidate();
    assert!(!cache_path.exists());
    assert!(index.current().is_none());
    index.ensure_built(&ps).expect("rebuild");
    assert_eq!(second.calls(), 1);
}

#[test]
fn concurrent_callers_share_one_build() {
    let embedder = CountingEmbedder::new();
    let index = Arc::new(EmbeddingIndex::new(embedder.clone(), options(64)));
    let ps = prompts(20);
    std::thread::scope(|s| {
        for _ in 0..8 {
            let index = Arc::clone(&index);
            let ps = &ps;
            s.spawn(move || {
                let snap = index.ensure_built(ps).expect("build");
                assert_eq!(snap.len(), 20);
            });
        }
    });
    assert_eq!(embedder.calls(), 1);
}

#[test]
fn duplicate_ids_are_indexed_once() {
    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), options(32));
    let mut ps = prompts(3);
    ps.push(Prompt::new("0", "shadow copy", "fastapi server api again"));

    let snap = index.ensure_built(&ps).expect("build");
    assert_eq!(snap.len(), 3);
    assert_eq!(snap.ids(), &["0".to_string(), "1".to_string(), "2".to_string()]);
    let hits = index.query("fastapi server", 10).expect("query");
    let zeros = hits.iter().filter(|(id, _)| id == "0").count();
    assert_eq!(zeros, 1);
}

#[test]
fn invalidate_racing_a_build_never_leaves_the_disk_snapshot_loaded() {
    let tmp = tempfile::tempdir().unwrap();
    let cache_path = tmp.path().join("index.json");
    let embedder = CountingEmbedder::new();
    let index = EmbeddingIndex::new(embedder.clone(), IndexOptions { cache_path: Some(cache_path.clone()), ..options(32) });
    let ps = prompts(4);

    for _ in 0..50 {
        index.ensure_built(&ps).expect("warm");
        assert!(cache_path.exists());
        let before = embedder.calls();
        let barrier = std::sync::Barrier::new(2);
        std::thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                index.invalidate();
            });
            s.spawn(|| {
                barrier.wait();
                index.ensure_built(&ps).expect("build");
            });
        });
        // a snapshot that survived the invalidate must have been freshly embedded
        if index.current().is_some() {
            assert!(embedder.calls() > before, "stale disk snapshot reloaded during invalidate");
        }
    }
}
