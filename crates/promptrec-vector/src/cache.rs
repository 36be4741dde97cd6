//! JSON snapshot file keyed by `(fingerprint, embedder_id)`.
//!
//! Consulted before embedding the collection and written through after a
//! build, so a restarted process can skip the provider entirely. Any
//! mismatch or parse problem reads as a miss.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use promptrec_core::error::Result;
use promptrec_core::types::PromptId;

use crate::fingerprint::Fingerprint;
use crate::snapshot::VectorIndexSnapshot;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    version: u32,
    fingerprint: Fingerprint,
    embedder_id: String,
    dim: usize,
    ids: Vec<PromptId>,
    vectors: Vec<Vec<f32>>,
}

pub fn load(path: &Path, fingerprint: &Fingerprint, embedder_id: &str, dim: usize) -> Result<Option<VectorIndexSnapshot>> {
    if !path.exists() { return Ok(None); }
    let raw = fs::read_to_string(path)?;
    let record: SnapshotRecord = serde_json::from_str(&raw)?;
    if record.version != FORMAT_VERSION
        || &record.fingerprint != fingerprint
        || record.embedder_id != embedder_id
        || record.dim != dim
    {
        return Ok(None);
    }
    VectorIndexSnapshot::from_parts(record.fingerprint, &record.embedder_id, record.dim, record.ids, record.vectors).map(Some)
}

pub fn save(path: &Path, snapshot: &VectorIndexSnapshot) -> Result<()> {
    let record = SnapshotRecord {
        version: FORMAT_VERSION,
        fingerprint: snapshot.fingerprint().clone(),
        embedder_id: snapshot.embedder_id().to_string(),
        dim: snapshot.dim(),
        ids: snapshot.ids().to_vec(),
        vectors: snapshot.rows().map(<[f32]>::to_vec).collect(),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec(&record)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn remove(path: &Path) -> Result<()> {
    if path.exists() { fs::remove_file(path)?; }
    Ok(())
}
