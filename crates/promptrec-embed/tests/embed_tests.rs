use promptrec_core::config::{EmbeddingBackend, EmbeddingSettings};
use promptrec_core::traits::Embedder;
use promptrec_embed::{get_default_embedder, FakeEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Fake, fake_dim: 256, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256);
    assert_eq!(embedder.dim(), 256);
    assert_eq!(embedder.embedder_id(), "fake:xxh64:d256");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_reflects_token_overlap() {
    let e = FakeEmbedder::new(512);
    let q = e.embed_text("FastAPI server");
    let near = e.embed_text("fastapi server login api");
    let far = e.embed_text("pandas csv plotting");
    assert!(cosine(&q, &near) > cosine(&q, &far));
    assert!((cosine(&q, &e.embed_text("fastapi, SERVER!")) - 1.0).abs() < 1e-5, "case and punctuation are ignored");
}

#[test]
fn fake_embedder_empty_text_is_zero_vector() {
    let v = FakeEmbedder::new(8).embed_text("   ");
    assert!(v.iter().all(|x| *x == 0.0));
}
