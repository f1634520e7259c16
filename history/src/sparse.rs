use std::{array, ops::Index};

use crate::{Tick, error::HistoryError, indexing::Cursor};

/// History of up to `N` samples with strictly increasing, possibly gapped
/// ticks. Logical index 0 is the oldest retained sample.
#[derive(Clone, Debug)]
pub struct SparseTickHistory<T: Clone + Default, const N: usize> {
    elements: [T; N],
    ticks: [Tick; N],
    cursor: Cursor<N>,
}

/// The two samples around a query point and how far between them it lies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bracket {
    pub low_index: usize,
    pub high_index: usize,
    pub low_tick: Tick,
    pub high_tick: Tick,
    /// 0.0 at `low_tick`, 1.0 at `high_tick`.
    pub fraction: f32,
}

impl<T, const N: usize> SparseTickHistory<T, N>
where
    T: Clone + Default,
{
    pub fn new() -> Self {
        const {
            assert!(N != 0, "capacity must not be zero");
        }

        Self {
            elements: array::from_fn(|_| T::default()),
            ticks: [0; N],
            cursor: Cursor::new(),
        }
    }

    /// Appends a sample, evicting the oldest one when full.
    ///
    /// `tick` must be greater than [`Self::last_tick`]; anything else means
    /// the producer broke its ordering contract and nothing is stored.
    pub fn push(&mut self, tick: Tick, element: T) -> Result<(), HistoryError> {
        if let Some(last) = self.last_tick() {
            if tick <= last {
                return Err(HistoryError::NonIncreasingTick { tick, last });
            }
        }

        let slot = self.cursor.push();
        self.elements[slot] = element;
        self.ticks[slot] = tick;
        Ok(())
    }

    /// Linear scan for an exact tick.
    pub fn get(&self, tick: Tick) -> Option<&T> {
        self.iter()
            .find(|&(stored, _)| stored == tick)
            .map(|(_, element)| element)
    }

    pub fn first_tick(&self) -> Option<Tick> {
        self.tick_at(0)
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.cursor.newest_slot().map(|slot| self.ticks[slot])
    }

    pub fn first(&self) -> Option<&T> {
        self.get_at(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.cursor.newest_slot().map(|slot| &self.elements[slot])
    }

    pub fn tick_at(&self, index: usize) -> Option<Tick> {
        (index < self.cursor.len()).then(|| self.ticks[self.cursor.slot(index)])
    }

    pub fn get_at(&self, index: usize) -> Option<&T> {
        (index < self.cursor.len()).then(|| &self.elements[self.cursor.slot(index)])
    }

    /// Index of the latest sample at or before `tick`.
    pub fn lower_index(&self, tick: Tick) -> Option<usize> {
        let mut found = None;

        for index in 0..self.cursor.len() {
            let stored = self.ticks[self.cursor.slot(index)];
            if stored == tick {
                return Some(index);
            }
            if stored > tick {
                break;
            }
            found = Some(index);
        }

        found
    }

    /// Index of the earliest sample at or after `tick`.
    pub fn higher_index(&self, tick: Tick) -> Option<usize> {
        (0..self.cursor.len()).find(|&index| self.ticks[self.cursor.slot(index)] >= tick)
    }

    /// Finds the samples to blend for the point `tick + fraction`.
    ///
    /// The low sample is the latest at or before `tick`, the high sample the
    /// earliest after it. Returns `None` when the point is not inside the
    /// recorded window.
    pub fn bracket(&self, tick: Tick, fraction: f32) -> Option<Bracket> {
        let low_index = self.lower_index(tick)?;
        let high_index = self.higher_index(tick.checked_add(1)?)?;

        let low_tick = self.ticks[self.cursor.slot(low_index)];
        let high_tick = self.ticks[self.cursor.slot(high_index)];

        // Widened so ticks at opposite ends of the range cannot overflow. A
        // zero span would only come from a corrupted window; the low sample
        // wins then.
        let span = (i128::from(high_tick) - i128::from(low_tick)) as f32;
        let offset = (i128::from(tick) - i128::from(low_tick)) as f32;
        let fraction = if span > 0.0 {
            (offset + fraction) / span
        } else {
            0.0
        };

        Some(Bracket {
            low_index,
            high_index,
            low_tick,
            high_tick,
            fraction,
        })
    }

    /// The low and high samples of a bracket from this history.
    pub fn states(&self, bracket: &Bracket) -> Option<(&T, &T)> {
        Some((
            self.get_at(bracket.low_index)?,
            self.get_at(bracket.high_index)?,
        ))
    }

    /// Empties the history and resets every slot to its default value.
    pub fn clear(&mut self) {
        self.cursor.clear();
        self.elements.fill(T::default());
        self.ticks.fill(0);
    }

    pub fn len(&self) -> usize {
        self.cursor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// `(tick, element)` pairs, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Tick, &T)> + ExactSizeIterator + '_ {
        (0..self.cursor.len()).map(move |index| {
            let slot = self.cursor.slot(index);
            (self.ticks[slot], &self.elements[slot])
        })
    }
}

impl<T, const N: usize> Default for SparseTickHistory<T, N>
where
    T: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Index<usize> for SparseTickHistory<T, N>
where
    T: Clone + Default,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len();
        self.get_at(index)
            .unwrap_or_else(|| panic!("history index {index} out of range for length {len}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(ticks: &[Tick]) -> SparseTickHistory<char, 4> {
        let mut history = SparseTickHistory::new();
        for (offset, &tick) in ticks.iter().enumerate() {
            let element = (b'a' + offset as u8) as char;
            history
                .push(tick, element)
                .expect("test ticks should be increasing");
        }
        history
    }

    #[test]
    fn push_rejects_ticks_that_do_not_increase() {
        let mut history = history_with(&[5]);

        assert_eq!(
            history.push(3, 'x'),
            Err(HistoryError::NonIncreasingTick { tick: 3, last: 5 })
        );
        assert_eq!(
            history.push(5, 'x'),
            Err(HistoryError::NonIncreasingTick { tick: 5, last: 5 })
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn empty_history_accepts_any_tick() {
        let mut history = SparseTickHistory::<u8, 2>::new();
        history.push(-50, 1).expect("empty history accepts negative ticks");
        assert_eq!(history.first_tick(), Some(-50));
    }

    #[test]
    fn exact_lookup_misses_gaps() {
        let history = history_with(&[5, 7, 9]);

        assert_eq!(history.first_tick(), Some(5));
        assert_eq!(history.last_tick(), Some(9));
        assert_eq!(history.get(7), Some(&'b'));
        assert_eq!(history.get(6), None);
    }

    #[test]
    fn full_history_evicts_the_oldest_sample() {
        let history = history_with(&[5, 7, 9, 11, 13]);

        assert_eq!(history.len(), 4);
        assert_eq!(history.first_tick(), Some(7));
        assert_eq!(history.first(), Some(&'b'));
        assert_eq!(history.last(), Some(&'e'));
        assert_eq!(history.get(5), None);
    }

    #[test]
    fn logical_indexes_are_offsets_from_the_oldest_across_the_wrap() {
        let history = history_with(&[1, 2, 3, 4, 5, 6]);

        for index in 0..history.len() {
            assert_eq!(history.tick_at(index), Some(index as Tick + 3));
            assert_eq!(history[index], (b'c' + index as u8) as char);
        }
        assert_eq!(history.tick_at(4), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn indexing_past_the_end_panics() {
        let history = history_with(&[1]);
        let _ = history[1];
    }

    #[test]
    fn first_and_last_are_none_when_empty() {
        let history = SparseTickHistory::<u8, 2>::new();
        assert_eq!(history.first(), None);
        assert_eq!(history.last(), None);
        assert_eq!(history.first_tick(), None);
        assert_eq!(history.last_tick(), None);
    }

    #[test]
    fn lower_index_finds_latest_at_or_before() {
        let history = history_with(&[10, 20, 30]);

        assert_eq!(history.lower_index(9), None);
        assert_eq!(history.lower_index(10), Some(0));
        assert_eq!(history.lower_index(25), Some(1));
        assert_eq!(history.lower_index(30), Some(2));
        assert_eq!(history.lower_index(99), Some(2));
    }

    #[test]
    fn higher_index_finds_earliest_at_or_after() {
        let history = history_with(&[10, 20, 30]);

        assert_eq!(history.higher_index(0), Some(0));
        assert_eq!(history.higher_index(11), Some(1));
        assert_eq!(history.higher_index(30), Some(2));
        assert_eq!(history.higher_index(31), None);
    }

    #[test]
    fn bracket_blends_between_neighbouring_samples() {
        let history = history_with(&[10, 20]);

        let bracket = history.bracket(10, 0.5).expect("tick 10 is bracketed");

        assert_eq!(bracket.low_index, 0);
        assert_eq!(bracket.high_index, 1);
        assert_eq!(bracket.low_tick, 10);
        assert_eq!(bracket.high_tick, 20);
        assert!((bracket.fraction - 0.05).abs() < 1e-6);
        assert_eq!(history.states(&bracket), Some((&'a', &'b')));
    }

    #[test]
    fn bracket_inside_a_gap_uses_the_surrounding_samples() {
        let history = history_with(&[10, 20, 30]);

        let bracket = history.bracket(25, 0.0).expect("tick 25 is bracketed");

        assert_eq!((bracket.low_tick, bracket.high_tick), (20, 30));
        assert!((bracket.fraction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bracket_outside_the_window_is_none() {
        let history = history_with(&[10, 20]);

        assert_eq!(history.bracket(25, 0.0), None);
        assert_eq!(history.bracket(20, 0.0), None);
        assert_eq!(history.bracket(9, 0.9), None);
        assert_eq!(history.bracket(Tick::MAX, 0.0), None);
    }

    #[test]
    fn bracket_spans_the_whole_tick_range() {
        let history = history_with(&[Tick::MIN, Tick::MAX]);

        let bracket = history.bracket(0, 0.0).expect("tick 0 is bracketed");

        assert_eq!((bracket.low_tick, bracket.high_tick), (Tick::MIN, Tick::MAX));
        assert!((bracket.fraction - 0.5).abs() < 1e-6);
        assert_eq!(history.states(&bracket), Some((&'a', &'b')));
    }

    #[test]
    fn clear_zeroes_storage_and_is_idempotent() {
        let mut history = history_with(&[1, 2, 3]);
        history.clear();
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.get(1), None);
        assert!(history.elements.iter().all(|&element| element == char::default()));
        assert!(history.ticks.iter().all(|&tick| tick == 0));

        history.push(1, 'z').expect("cleared history accepts old ticks");
        assert_eq!(history.first_tick(), Some(1));
    }
}
