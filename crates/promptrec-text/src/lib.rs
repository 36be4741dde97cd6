//! promptrec-text
//!
//! Rule-based side of the recommender: dictionary tag extraction and the
//! fixed-weight keyword ranker. See `tags` and `ranker`.

pub mod ranker;
pub mod tags;

pub use ranker::KeywordRanker;
pub use tags::TagExtractor;
