//! The two slot conventions used by the histories.
//!
//! [`TickModulo`] maps a tick straight onto a slot and is only used by the
//! dense history. [`Cursor`] tracks an insertion window and is shared by the
//! ring and the sparse history, so a logical index always means "offset from
//! the oldest retained entry".

use crate::{Tick, error::HistoryError};

/// Slot for a tick is `tick mod N`.
pub struct TickModulo<const N: usize>;

impl<const N: usize> TickModulo<N> {
    #[inline(always)]
    pub fn slot(tick: Tick) -> usize {
        // `rem_euclid` keeps negative ticks in range.
        tick.rem_euclid(N as Tick) as usize
    }
}

/// Insertion cursor over `N` slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor<const N: usize> {
    head: usize, // Slot of the oldest retained entry.
    len: usize,
}

impl<const N: usize> Cursor<N> {
    pub const fn new() -> Self {
        Self { head: 0, len: 0 }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Physical slot of the entry `offset` places after the oldest one.
    #[inline(always)]
    pub fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % N
    }

    pub fn newest_slot(&self) -> Option<usize> {
        self.len.checked_sub(1).map(|offset| self.slot(offset))
    }

    /// Claims the slot for a new entry. When full, the claimed slot is the
    /// oldest entry's, and the window slides forward by one.
    pub fn push(&mut self) -> usize {
        let slot = self.slot(self.len);

        if self.is_full() {
            self.head = (self.head + 1) % N;
        } else {
            self.len += 1;
        }

        slot
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn reset(&mut self, head: usize, len: usize) -> Result<(), HistoryError> {
        if head >= N || len > N {
            return Err(HistoryError::InvalidCursor {
                head,
                len,
                capacity: N,
            });
        }

        self.head = head;
        self.len = len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_modulo_wraps_negative_ticks_into_range() {
        assert_eq!(TickModulo::<4>::slot(0), 0);
        assert_eq!(TickModulo::<4>::slot(5), 1);
        assert_eq!(TickModulo::<4>::slot(-1), 3);
        assert_eq!(TickModulo::<4>::slot(-4), 0);
    }

    #[test]
    fn push_fills_then_slides_the_window() {
        let mut cursor = Cursor::<3>::new();

        assert_eq!(cursor.push(), 0);
        assert_eq!(cursor.push(), 1);
        assert_eq!(cursor.push(), 2);
        assert!(cursor.is_full());
        assert_eq!(cursor.head(), 0);

        // The oldest slot is reused and the head moves past it.
        assert_eq!(cursor.push(), 0);
        assert_eq!(cursor.head(), 1);
        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.newest_slot(), Some(0));
        assert_eq!(cursor.slot(0), 1);
    }

    #[test]
    fn newest_slot_is_none_when_empty() {
        let cursor = Cursor::<2>::new();
        assert_eq!(cursor.newest_slot(), None);
    }

    #[test]
    fn reset_rejects_cursors_that_do_not_fit() {
        let mut cursor = Cursor::<4>::new();

        assert_eq!(
            cursor.reset(4, 0),
            Err(HistoryError::InvalidCursor {
                head: 4,
                len: 0,
                capacity: 4
            })
        );
        assert!(cursor.reset(0, 5).is_err());

        cursor.reset(3, 4).expect("cursor should fit");
        assert_eq!(cursor.slot(1), 0);
    }
}
