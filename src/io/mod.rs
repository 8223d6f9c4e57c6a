//! Input/output helpers.
//!
//! - spectrum / image / frame ingest (`ingest`)
//! - fit exports (JSON/CSV) and spectrum writing (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
