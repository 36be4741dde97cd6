use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use promptrec_core::config::{resolve_with_base, Config, Settings};
use promptrec_core::store::JsonPromptStore;
use promptrec_core::traits::{Embedder, PromptStore};
use promptrec_core::types::{Prompt, RecommendMode, RecommendOutcome};
use promptrec_embed::get_default_embedder;
use promptrec_hybrid::Recommender;
use promptrec_text::TagExtractor;
use promptrec_vector::{EmbeddingIndex, IndexOptions};

#[derive(Debug, Parser)]
#[command(name = "promptrec", version, rename_all = "kebab", about = "Recommend stored prompts from a free-text request")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank prompts for a request.
    Recommend {
        text: String,
        #[arg(long, value_enum, default_value_t = Mode::Hybrid)]
        mode: Mode,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
        /// Prompt file or directory; defaults to `data.prompts_path`.
        #[arg(long, value_name = "PATH")]
        prompts: Option<PathBuf>,
        /// Give up on the vector index after this long (hybrid mode).
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Show the categories and keywords matched in a text.
    Tags { text: String },
    /// Build (or load) the vector index for the prompt collection.
    Index {
        #[arg(long, value_name = "PATH")]
        prompts: Option<PathBuf>,
    },
    /// Drop the on-disk vector index cache.
    Invalidate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Keyword,
    Vector,
    Hybrid,
}

impl From<Mode> for RecommendMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Keyword => RecommendMode::Keyword,
            Mode::Vector => RecommendMode::Vector,
            Mode::Hybrid => RecommendMode::Hybrid,
        }
    }
}

/// Stands in when the model cannot be loaded so keyword mode keeps working
/// and the vector path reports itself unavailable.
struct UnavailableEmbedder {
    reason: String,
}

impl Embedder for UnavailableEmbedder {
    fn embedder_id(&self) -> &str { "unavailable" }
    fn dim(&self) -> usize { 0 }
    fn max_len(&self) -> usize { 0 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { Err(anyhow!(self.reason.clone())) }
}

fn load_embedder(settings: &Settings) -> Arc<dyn Embedder> {
    match get_default_embedder(&settings.embedding) {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "embedding model unavailable, vector ranking disabled");
            Arc::new(UnavailableEmbedder { reason: e.to_string() })
        }
    }
}

fn load_prompts(base: &Path, settings: &Settings, override_path: Option<PathBuf>) -> anyhow::Result<Vec<Prompt>> {
    let path = override_path.unwrap_or_else(|| resolve_with_base(base, &settings.data.prompts_path));
    let prompts = JsonPromptStore::new(path).load_prompts()?;
    Ok(prompts)
}

fn print_outcome(mode: RecommendMode, outcome: &RecommendOutcome) {
    match outcome {
        RecommendOutcome::Results(_) => {}
        RecommendOutcome::Degraded { reason, .. } => println!("⚠️  vector ranking unavailable ({reason}), showing keyword matches"),
        RecommendOutcome::Unavailable { reason } => {
            println!("❌ {mode} recommendation unavailable: {reason}");
            return;
        }
    }
    let results = outcome.candidates();
    if results.is_empty() {
        println!("No matching prompts.");
        return;
    }
    println!("🔍 {} {} results", results.len(), mode);
    for c in results {
        let p = &c.prompt;
        println!("\n  {}. score={:.4}  id={}  category={}  level={:?}", c.rank, c.score, p.id, p.category, p.level);
        println!("     {}", p.title);
        if !p.keywords.is_empty() {
            println!("     keywords: {}", p.keywords.join(", "));
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let settings = Config::load()?.settings()?;
    let base = std::env::current_dir()?;

    match args.command {
        Command::Recommend { text, mode, top_k, prompts, timeout_ms } => {
            let prompts = load_prompts(&base, &settings, prompts)?;
            let recommender = Recommender::from_settings(&settings, load_embedder(&settings), &base);
            let top_k = top_k.unwrap_or(settings.recommend.top_k);
            let mode = RecommendMode::from(mode);
            let outcome = if mode == RecommendMode::Hybrid {
                let timeout = Duration::from_millis(timeout_ms.unwrap_or(settings.recommend.rebuild_timeout_ms));
                recommender.hybrid_recommend_within(&text, &prompts, top_k, timeout).await
            } else {
                recommender.recommend(mode, &text, &prompts, top_k)
            };
            print_outcome(mode, &outcome);
        }
        Command::Tags { text } => {
            let tags = TagExtractor::new(settings.categories.clone()).extract(&text);
            if tags.is_empty() {
                println!("No tags matched.");
            } else {
                println!("categories: {}", tags.categories.iter().cloned().collect::<Vec<_>>().join(", "));
                println!("keywords:   {}", tags.keywords.iter().cloned().collect::<Vec<_>>().join(", "));
            }
        }
        Command::Index { prompts } => {
            let prompts = load_prompts(&base, &settings, prompts)?;
            let recommender = Recommender::from_settings(&settings, load_embedder(&settings), &base);
            let start = Instant::now();
            let snapshot = recommender.index().ensure_built(&prompts)?;
            println!(
                "✅ Index ready: {} prompts, dim={}, fingerprint={}, embedder={} ({:.2?})",
                snapshot.len(),
                snapshot.dim(),
                snapshot.fingerprint(),
                snapshot.embedder_id(),
                start.elapsed()
            );
        }
        Command::Invalidate => {
            // no model needed to drop the cache file
            let embedder = Arc::new(UnavailableEmbedder { reason: "not loaded".to_string() });
            EmbeddingIndex::new(embedder, IndexOptions::from_settings(&settings, &base)).invalidate();
            println!("🗑️  Vector index cache invalidated");
        }
    }
    Ok(())
}
