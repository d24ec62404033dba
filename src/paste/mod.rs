//! The pasting engine: parses tabular alignments, pastes consistent
//! neighbours together along the query/subject axes, and recomputes their
//! similarity statistics.

pub mod batch;
pub mod config;
pub mod error;
pub mod record;
pub mod scoring;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::AlignmentBatch;
pub use error::Error;
pub use record::{Alignment, PasteParameters};
pub use scoring::ScoringSystem;
