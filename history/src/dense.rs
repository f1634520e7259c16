use std::array;

use tracing::trace;

use crate::{Tick, indexing::TickModulo};

/// History of the most recent `N` consecutive ticks, stored at `tick mod N`.
///
/// Any push that does not follow the last tick by exactly one discards the
/// older entries: with modulo slots, a gap would make stale values look like
/// valid ones. Callers that need to tolerate gaps should use
/// [`SparseTickHistory`](crate::SparseTickHistory) instead.
#[derive(Clone, Debug)]
pub struct DenseTickHistory<T: Clone + Default, const N: usize> {
    array: [T; N],
    last_tick: Tick,
    size: usize, // Number of valid consecutive ticks ending at `last_tick`.
}

impl<T, const N: usize> DenseTickHistory<T, N>
where
    T: Clone + Default,
{
    pub fn new() -> Self {
        const {
            assert!(N != 0, "capacity must not be zero");
        }

        Self {
            array: array::from_fn(|_| T::default()),
            last_tick: 0,
            size: 0,
        }
    }

    /// Records `value` for `tick`. Never fails: a repeated, decreasing or
    /// skipped tick restarts the history at this tick.
    pub fn push(&mut self, value: T, tick: Tick) {
        self.array[TickModulo::<N>::slot(tick)] = value;

        let consecutive = self.size > 0 && self.last_tick.checked_add(1) == Some(tick);
        if consecutive {
            self.size = (self.size + 1).min(N);
        } else {
            if self.size > 0 {
                trace!(
                    tick,
                    last_tick = self.last_tick,
                    discarded = self.size,
                    "non-consecutive tick; dense history restarted"
                );
            }
            self.size = 1;
        }

        self.last_tick = tick;
    }

    /// Overwrites the slot for `tick` without touching the valid window.
    /// Meant for amending a tick that is already recorded; the caller is
    /// responsible for checking that with [`Self::is_valid_tick`].
    pub fn set(&mut self, value: T, tick: Tick) {
        self.array[TickModulo::<N>::slot(tick)] = value;
    }

    pub fn get(&self, tick: Tick) -> Option<&T> {
        self.is_valid_tick(tick)
            .then(|| &self.array[TickModulo::<N>::slot(tick)])
    }

    pub fn is_valid_tick(&self, tick: Tick) -> bool {
        self.first_tick()
            .is_some_and(|first| first <= tick && tick <= self.last_tick)
    }

    pub fn first_tick(&self) -> Option<Tick> {
        // `size - 1` earlier ticks were pushed before `last_tick`, so this
        // stays in range even at `Tick::MIN`.
        (self.size > 0).then(|| self.last_tick - (self.size - 1) as Tick)
    }

    pub fn last_tick(&self) -> Option<Tick> {
        (self.size > 0).then_some(self.last_tick)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// `(tick, value)` pairs from the first valid tick to the last.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Tick, &T)> + '_ {
        self.first_tick()
            .into_iter()
            .flat_map(move |first| first..=self.last_tick)
            .map(move |tick| (tick, &self.array[TickModulo::<N>::slot(tick)]))
    }
}

impl<T, const N: usize> Default for DenseTickHistory<T, N>
where
    T: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
