//! promptrec-embed
//!
//! Embedding providers behind [`promptrec_core::traits::Embedder`]: a local
//! BERT-family sentence model run with candle (mean pooling + L2), and a
//! hashed [`FakeEmbedder`] for tests and offline development.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use promptrec_core::config::{expand_path, EmbeddingBackend, EmbeddingSettings};
use promptrec_core::traits::Embedder;

pub mod device;
pub mod fake;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use fake::FakeEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

/// Sentence-transformer style encoder loaded from a local model directory
/// (`config.json`, `tokenizer.json`, `model.safetensors` or `pytorch_model.bin`).
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize, device: Device) -> Result<Self> {
        info!(dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "model".to_string());
        info!(dim, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id: format!("bert:{name}:d{dim}") })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.squeeze(0)?.to_device(&Device::Cpu)?.to_vec1()?;
        if v.len() != self.dim {
            return Err(anyhow!("dim mismatch: got {} expected {}", v.len(), self.dim));
        }
        if start.elapsed().as_millis() > 100 { debug!(ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(v)
    }
}

impl Embedder for SentenceEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    Err(anyhow!("no model weights in {}", model_dir.display()))
}

fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the configured provider. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// fake embedder regardless of settings.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_requested() || settings.backend == EmbeddingBackend::Fake {
        info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let dir = resolve_model_dir(settings)?;
    Ok(Arc::new(SentenceEmbedder::load(&dir, settings.max_len, select_device(settings.device))?))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if !settings.model_dir.trim().is_empty() {
        let p = expand_path(&settings.model_dir);
        if p.exists() { return Ok(p); }
        warn!(dir = %p.display(), "configured model_dir does not exist");
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { info!(dir = %p.display(), "using {}", var); return Ok(p); }
        }
    }
    for candidate in ["models/sentence-embedding", "../models/sentence-embedding"] {
        let p = Path::new(candidate);
        if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate sentence embedding model directory"))
}
