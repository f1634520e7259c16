use thiserror::Error;

use crate::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("tick {tick} is not after the last recorded tick {last}")]
    NonIncreasingTick { tick: Tick, last: Tick },
    #[error("index {index} out of range for history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cursor (head {head}, len {len}) does not fit a capacity of {capacity}")]
    InvalidCursor {
        head: usize,
        len: usize,
        capacity: usize,
    },
    #[error("expected {expected} slots, found {found}")]
    CapacityMismatch { expected: usize, found: usize },
}
