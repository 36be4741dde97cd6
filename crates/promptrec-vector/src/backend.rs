use anyhow::{bail, Result};

use promptrec_core::traits::VectorBackend;

/// Scale `v` to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() { *x /= norm; }
    }
}

/// Exhaustive inner-product index over a contiguous row-major buffer.
/// Prompt collections are small, so a flat scan is exact and fast enough.
#[derive(Debug, Clone, Default)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new() } }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if self.dim == 0 || i >= self.len() { return None; }
        Some(&self.data[i * self.dim..(i + 1) * self.dim])
    }
}

impl VectorBackend for FlatIpIndex {
    fn dim(&self) -> usize { self.dim }

    fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != self.dim { bail!("vector {} has dim {}, index expects {}", i, v.len(), self.dim); }
        }
        for v in vectors { self.data.extend_from_slice(v); }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || query.len() != self.dim || self.is_empty() { return Vec::new(); }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (i, row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>()))
            .collect();
        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}
