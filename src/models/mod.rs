//! Line profile models.
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic over the solver.

pub mod gaussian;

pub use gaussian::*;
