//! Ticks travel as their low 16 bits; receivers widen them back against a
//! tick they already know.

use crate::Tick;

/// Histories fed from the wire must stay well inside the ±32 767 tick window
/// that `widen` can disambiguate.
pub const MAX_WIDENABLE_CAPACITY: usize = 1 << 14;

pub const fn wire_id(tick: Tick) -> u16 {
    tick as u16
}

/// Reconstructs the full tick closest to `reference` whose low 16 bits are
/// `id`.
pub fn widen(reference: Tick, id: u16) -> Option<Tick> {
    let modular_difference = id.wrapping_sub(wire_id(reference));

    // Reinterpreting as `i16` turns distances past half the range into
    // negative ones, i.e. ids from before the reference.
    let difference = modular_difference as i16 as Tick;

    reference.checked_add(difference)
}
