//! Fixed-capacity, tick-indexed history buffers for rollback and
//! snapshot-interpolation netcode.
//!
//! Nothing here allocates after construction: every container is backed by an
//! `[T; N]` array plus a couple of cursor integers.

pub mod dense;
pub mod error;
pub mod indexing;
pub mod ring;
pub mod sparse;
pub mod wire;

pub use dense::DenseTickHistory;
pub use error::HistoryError;
pub use ring::{FixedRing, RingState};
pub use sparse::{Bracket, SparseTickHistory};

/// A discrete simulation step.
pub type Tick = i64;
