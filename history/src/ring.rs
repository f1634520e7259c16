use std::{
    array,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

use crate::{error::HistoryError, indexing::Cursor};

/// Fixed-capacity FIFO that overwrites its oldest element when full.
///
/// Index 0 is always the oldest retained element.
#[derive(Clone, Debug)]
pub struct FixedRing<T: Clone + Default, const N: usize> {
    array: [T; N],
    cursor: Cursor<N>,
}

/// Raw slots and cursor of a [`FixedRing`], for saving and restoring it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingState<T> {
    pub slots: Vec<T>,
    pub head: usize,
    pub len: usize,
}

impl<T, const N: usize> FixedRing<T, N>
where
    T: Clone + Default,
{
    pub fn new() -> Self {
        const {
            assert!(N != 0, "capacity must not be zero");
        }

        Self {
            array: array::from_fn(|_| T::default()),
            cursor: Cursor::new(),
        }
    }

    pub fn push(&mut self, value: T) {
        let slot = self.cursor.push();
        self.array[slot] = value;
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        (index < self.cursor.len()).then(|| &self.array[self.cursor.slot(index)])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.cursor.len() {
            Some(&mut self.array[self.cursor.slot(index)])
        } else {
            None
        }
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), HistoryError> {
        let len = self.len();
        let slot = self
            .get_mut(index)
            .ok_or(HistoryError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.cursor.newest_slot().map(|slot| &self.array[slot])
    }

    /// Forgets every element. The slots keep their stale values until they
    /// are overwritten, but none of them are reachable.
    pub fn clear(&mut self) {
        self.cursor.clear();
    }

    /// Points the ring at an existing window over its slots, e.g. after
    /// restoring them from disk.
    pub fn reset(&mut self, head: usize, len: usize) -> Result<(), HistoryError> {
        self.cursor.reset(head, len)
    }

    pub fn len(&self) -> usize {
        self.cursor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cursor.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        (0..self.cursor.len()).map(move |offset| &self.array[self.cursor.slot(offset)])
    }

    pub fn to_state(&self) -> RingState<T> {
        RingState {
            slots: self.array.to_vec(),
            head: self.cursor.head(),
            len: self.cursor.len(),
        }
    }

    pub fn from_state(state: RingState<T>) -> Result<Self, HistoryError> {
        let RingState { slots, head, len } = state;
        let found = slots.len();
        let array: [T; N] = slots
            .try_into()
            .map_err(|_| HistoryError::CapacityMismatch { expected: N, found })?;

        let mut ring = Self {
            array,
            cursor: Cursor::new(),
        };
        ring.reset(head, len)?;
        Ok(ring)
    }
}

impl<T, const N: usize> Default for FixedRing<T, N>
where
    T: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Index<usize> for FixedRing<T, N>
where
    T: Clone + Default,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len();
        self.get(index)
            .unwrap_or_else(|| panic!("ring index {index} out of range for length {len}"))
    }
}

impl<T, const N: usize> IndexMut<usize> for FixedRing<T, N>
where
    T: Clone + Default,
{
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        self.get_mut(index)
            .unwrap_or_else(|| panic!("ring index {index} out of range for length {len}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_items_in_insertion_order_below_capacity() {
        let mut ring = FixedRing::<u32, 4>::new();
        ring.push(10);
        ring.push(20);
        ring.push(30);

        assert_eq!(ring.len(), 3);
        assert_eq!(ring.get(0), Some(&10));
        assert_eq!(ring.get(1), Some(&20));
        assert_eq!(ring.get(2), Some(&30));
        assert_eq!(ring.get(3), None);
    }

    #[test]
    fn oldest_items_are_evicted_once_full() {
        let mut ring = FixedRing::<u32, 4>::new();
        for value in 1..=6 {
            ring.push(value);
        }

        assert!(ring.is_full());
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5, 6]);
        assert_eq!(ring[0], 3);
        assert_eq!(ring.first(), Some(&3));
        assert_eq!(ring.last(), Some(&6));
    }

    #[test]
    fn every_logical_index_is_oldest_first_across_the_wrap() {
        let mut ring = FixedRing::<u32, 4>::new();
        for value in 0..6 {
            ring.push(value);
        }

        for index in 0..ring.len() {
            assert_eq!(ring[index], index as u32 + 2);
        }
    }

    #[test]
    fn set_overwrites_in_place_and_rejects_out_of_range() {
        let mut ring = FixedRing::<u32, 3>::new();
        ring.push(1);
        ring.push(2);

        ring.set(1, 20).expect("index 1 should be in range");
        assert_eq!(ring[1], 20);

        assert_eq!(
            ring.set(2, 30),
            Err(HistoryError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn index_mut_writes_through() {
        let mut ring = FixedRing::<u32, 2>::new();
        ring.push(1);
        ring[0] += 41;
        assert_eq!(ring[0], 42);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn indexing_after_clear_panics() {
        let mut ring = FixedRing::<u32, 2>::new();
        ring.push(1);
        ring.clear();
        let _ = ring[0];
    }

    #[test]
    fn clear_twice_is_the_same_as_clear_once() {
        let mut ring = FixedRing::<u32, 3>::new();
        ring.push(1);
        ring.push(2);

        ring.clear();
        let once = (ring.len(), ring.to_state());
        ring.clear();
        let twice = (ring.len(), ring.to_state());

        assert_eq!(once, twice);
        assert!(ring.is_empty());
        assert_eq!(ring.get(0), None);
    }

    #[test]
    fn reset_exposes_the_described_window_over_existing_slots() {
        let mut ring = FixedRing::<u32, 4>::new();
        for value in [10, 11, 12, 13] {
            ring.push(value);
        }

        ring.reset(2, 3).expect("cursor should fit");

        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![12, 13, 10]);
        assert!(ring.reset(4, 1).is_err());
    }

    #[test]
    fn from_state_rejects_the_wrong_number_of_slots() {
        let state = RingState {
            slots: vec![1u32, 2, 3],
            head: 0,
            len: 3,
        };

        let result = FixedRing::<u32, 4>::from_state(state);

        assert_eq!(
            result.err(),
            Some(HistoryError::CapacityMismatch {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn state_restores_the_same_logical_window() {
        let mut ring = FixedRing::<u32, 3>::new();
        for value in 0..5 {
            ring.push(value);
        }

        let restored = FixedRing::<u32, 3>::from_state(ring.to_state())
            .expect("state from a ring of the same capacity should restore");

        assert_eq!(
            restored.iter().collect::<Vec<_>>(),
            ring.iter().collect::<Vec<_>>()
        );
    }
}
