use std::collections::HashMap;

use promptrec_core::error::{Error, Result};
use promptrec_core::traits::VectorBackend;
use promptrec_core::types::PromptId;

use crate::backend::FlatIpIndex;
use crate::fingerprint::Fingerprint;

/// Immutable result of one successful index build.
///
/// Position `i` in `ids` is row `i` of the backend. Vectors are unit norm.
#[derive(Debug)]
pub struct VectorIndexSnapshot {
    fingerprint: Fingerprint,
    embedder_id: String,
    ids: Vec<PromptId>,
    vectors: HashMap<PromptId, Vec<f32>>,
    index: FlatIpIndex,
}

impl VectorIndexSnapshot {
    pub fn from_parts(
        fingerprint: Fingerprint,
        embedder_id: &str,
        dim: usize,
        ids: Vec<PromptId>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(Error::Operation(format!("{} ids for {} vectors", ids.len(), vectors.len())));
        }
        let mut index = FlatIpIndex::new(dim);
        index.add(&vectors).map_err(|e| Error::Operation(e.to_string()))?;
        let by_id = ids.iter().cloned().zip(vectors).collect();
        Ok(Self { fingerprint, embedder_id: embedder_id.to_string(), ids, vectors: by_id, index })
    }

    pub fn fingerprint(&self) -> &Fingerprint { &self.fingerprint }

    pub fn embedder_id(&self) -> &str { &self.embedder_id }

    pub fn dim(&self) -> usize { self.index.dim() }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn ids(&self) -> &[PromptId] { &self.ids }

    pub fn vector(&self, id: &str) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    /// Vectors in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.len()).filter_map(|i| self.index.row(i))
    }

    pub fn matches(&self, fingerprint: &Fingerprint, embedder_id: &str) -> bool {
        &self.fingerprint == fingerprint && self.embedder_id == embedder_id
    }

    /// Top `k` prompt ids by inner product with a unit query vector.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(PromptId, f32)> {
        self.index
            .search(query, k)
            .into_iter()
            .filter_map(|(pos, score)| self.ids.get(pos).map(|id| (id.clone(), score)))
            .collect()
    }
}
