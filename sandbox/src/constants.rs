use history::wire::MAX_WIDENABLE_CAPACITY;

pub const INPUT_HISTORY_LENGTH: usize = 256; // 256 ticks, ~4.3s at 60Hz.
pub const SNAPSHOT_BUFFER_LENGTH: usize = 16; // 16 snapshots, 0.8s at one every 3 ticks.
pub const POSITION_TRAIL_LENGTH: usize = 64;

pub const MAX_TICKS_PER_FRAME: u32 = 8;

const _: () = assert!(SNAPSHOT_BUFFER_LENGTH <= MAX_WIDENABLE_CAPACITY);
