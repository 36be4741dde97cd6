//! promptrec-core
//!
//! Shared data model, error taxonomy, collaborator traits, configuration
//! and the JSON prompt store used by the ranking crates.

pub mod config;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;
