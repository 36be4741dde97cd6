//! promptrec-vector
//!
//! Semantic side of the recommender. [`EmbeddingIndex`] keeps one cached
//! snapshot of unit vectors per prompt collection and rebuilds it when the
//! collection fingerprint changes; [`VectorRanker`] turns index hits into
//! scored candidates.

pub mod backend;
pub mod cache;
pub mod fingerprint;
pub mod index;
pub mod ranker;
pub mod snapshot;

pub use backend::{l2_normalize, FlatIpIndex};
pub use fingerprint::Fingerprint;
pub use index::{EmbeddingIndex, IndexHandle, IndexOptions};
pub use ranker::VectorRanker;
pub use snapshot::VectorIndexSnapshot;
