//! Read-only JSON prompt store.
//!
//! Accepts a single file or a directory of `*.json` files. Each file holds
//! either a bare array of prompt records or `{ "prompts": [...] }`. Records
//! are normalized (trimmed text, defaulted level, string keywords) and
//! duplicates by title or body are dropped, first occurrence wins.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::traits::PromptStore;
use crate::types::Prompt;

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub dedupe: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self { dedupe: true }
    }
}

#[derive(Default)]
pub struct PromptLoader {
    options: LoaderOptions,
}

impl PromptLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_options(options: LoaderOptions) -> Self { Self { options } }

    /// Load from a file or directory. A missing path is an empty collection.
    pub fn load_path(&self, path: &Path) -> Result<Vec<Prompt>> {
        if path.is_dir() {
            self.load_directory(path)
        } else if path.is_file() {
            self.load_file(path)
        } else {
            debug!(path = %path.display(), "prompt source missing, using empty collection");
            Ok(Vec::new())
        }
    }

    pub fn load_file(&self, path: &Path) -> Result<Vec<Prompt>> {
        let prompts = self.read_records(path)?;
        Ok(self.finish(prompts))
    }

    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Prompt>> {
        let files = self.list_json_files(dir);
        if files.is_empty() {
            info!(dir = %dir.display(), "no .json files found");
            return Ok(Vec::new());
        }
        let mut all = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "loading prompt file {}/{}", file_index + 1, files.len());
            all.extend(self.read_records(file_path)?);
        }
        let prompts = self.finish(all);
        info!("loaded {} prompts from {} files", prompts.len(), files.len());
        Ok(prompts)
    }

    fn read_records(&self, path: &Path) -> Result<Vec<Prompt>> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let records = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("prompts") {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!(file = %path.display(), "object without a \"prompts\" array, skipping");
                    Vec::new()
                }
            },
            _ => {
                warn!(file = %path.display(), "unexpected JSON shape, skipping");
                Vec::new()
            }
        };
        let mut prompts = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Prompt>(record) {
                Ok(p) => prompts.push(p),
                Err(e) => warn!(file = %path.display(), index = i, "invalid prompt record: {}", e),
            }
        }
        Ok(prompts)
    }

    fn finish(&self, prompts: Vec<Prompt>) -> Vec<Prompt> {
        let prompts = prompts.into_iter().filter_map(normalize_prompt);
        if self.options.dedupe { remove_duplicates(prompts) } else { prompts.collect() }
    }

    fn list_json_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut json_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") { json_files.push(path.to_path_buf()); }
        }
        json_files.sort();
        json_files
    }
}

/// Trim text fields and drop keyword blanks. Records without an id are
/// rejected since identity drives fusion and caching.
pub fn normalize_prompt(mut prompt: Prompt) -> Option<Prompt> {
    prompt.id = prompt.id.trim().to_string();
    if prompt.id.is_empty() {
        warn!(title = %prompt.title, "prompt without id, skipping");
        return None;
    }
    prompt.title = prompt.title.trim().to_string();
    prompt.body = prompt.body.trim().to_string();
    prompt.category = prompt.category.trim().to_string();
    prompt.tool = prompt.tool.trim().to_string();
    prompt.framework = prompt.framework.trim().to_string();
    prompt.keywords = prompt
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    Some(prompt)
}

/// Keep the first prompt per id, per case-folded title and per case-folded
/// body. Records with an empty title or body are dropped.
pub fn remove_duplicates<I: IntoIterator<Item = Prompt>>(prompts: I) -> Vec<Prompt> {
    let mut seen_ids = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut seen_bodies = HashSet::new();
    let mut unique = Vec::new();
    for prompt in prompts {
        let title = prompt.title.to_lowercase();
        let body = prompt.body.to_lowercase();
        if title.is_empty() || body.is_empty() {
            continue;
        }
        if seen_ids.contains(&prompt.id) || seen_titles.contains(&title) || seen_bodies.contains(&body) {
            debug!(id = %prompt.id, "duplicate prompt dropped");
            continue;
        }
        seen_ids.insert(prompt.id.clone());
        seen_titles.insert(title);
        seen_bodies.insert(body);
        unique.push(prompt);
    }
    unique
}

/// `PromptStore` backed by a JSON file or directory.
pub struct JsonPromptStore {
    path: PathBuf,
    loader: PromptLoader,
}

impl JsonPromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), loader: PromptLoader::new() }
    }

    pub fn with_loader(path: impl Into<PathBuf>, loader: PromptLoader) -> Self {
        Self { path: path.into(), loader }
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl PromptStore for JsonPromptStore {
    fn load_prompts(&self) -> Result<Vec<Prompt>> {
        self.loader.load_path(&self.path)
    }
}
