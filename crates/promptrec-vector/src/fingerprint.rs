use serde::{Deserialize, Serialize};
use std::fmt;

use promptrec_core::config::FingerprintMode;
use promptrec_core::types::Prompt;

/// Cheap proxy for "is the cached index still about this collection".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// `Identity` hashes the ordered ids and the count; `Content` also
    /// hashes each prompt's indexed text.
    pub fn of(prompts: &[Prompt], mode: FingerprintMode) -> Self {
        let mut hasher = blake3::Hasher::new();
        let tag: &[u8] = match mode {
            FingerprintMode::Identity => b"identity",
            FingerprintMode::Content => b"content",
        };
        hasher.update(tag);
        hasher.update(&(prompts.len() as u64).to_le_bytes());
        for p in prompts {
            hasher.update(p.id.as_bytes());
            hasher.update(&[0]);
            if mode == FingerprintMode::Content {
                hasher.update(p.indexed_text().as_bytes());
                hasher.update(&[0]);
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..self.0.len().min(12)])
    }
}
