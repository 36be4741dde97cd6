use promptrec_core::config::Config;
use promptrec_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let texts = vec!["react login form".to_string(), "fastapi file upload".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("id={} B={} dim={}", embedder.embedder_id(), embs.len(), embedder.dim());
    Ok(())
}
