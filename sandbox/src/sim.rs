use std::fmt;

use glam::{Vec3, vec3};
use history::{DenseTickHistory, FixedRing, SparseTickHistory, Tick, wire};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::Config,
    constants::{INPUT_HISTORY_LENGTH, POSITION_TRAIL_LENGTH, SNAPSHOT_BUFFER_LENGTH},
};

pub const MAX_SPEED: f32 = 240.0; // Units per second.
pub const ACCELERATION: f32 = 1200.0; // Reaches MAX_SPEED in 0.2 seconds.
pub const FRICTION: f32 = 5.0;
pub const ARENA_HALF_EXTENT: f32 = 400.0;

pub type InputHistory = DenseTickHistory<PlayerInput, INPUT_HISTORY_LENGTH>;
pub type SnapshotHistory = SparseTickHistory<BodyState, SNAPSHOT_BUFFER_LENGTH>;
pub type PositionTrail = FixedRing<Vec3, POSITION_TRAIL_LENGTH>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl fmt::Display for PlayerInput {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = [
            (self.forward, "forward"),
            (self.backward, "backward"),
            (self.left, "left"),
            (self.right, "right"),
        ]
        .into_iter()
        .filter_map(|(held, name)| held.then_some(name))
        .collect();

        if keys.is_empty() {
            formatter.write_str("idle")
        } else {
            formatter.write_str(&keys.join("+"))
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl BodyState {
    /// One fixed step of movement on the ground plane.
    pub fn advance(self, input: &PlayerInput, dt: f32) -> Self {
        let Self {
            mut position,
            mut velocity,
        } = self;

        let mut wish_dir = Vec3::ZERO;
        if input.forward {
            wish_dir.z += 1.0;
        }
        if input.backward {
            wish_dir.z -= 1.0;
        }
        if input.right {
            wish_dir.x += 1.0;
        }
        if input.left {
            wish_dir.x -= 1.0;
        }
        if wish_dir.length_squared() > 0.001 {
            wish_dir = wish_dir.normalize();
        }

        velocity += wish_dir * ACCELERATION * dt;

        let speed = velocity.length();
        if speed > MAX_SPEED {
            velocity = velocity.normalize() * MAX_SPEED;
        } else if speed > 0.0 {
            let new_speed = (speed - speed * FRICTION * dt).max(0.0);
            velocity *= new_speed / speed;
        }

        position += velocity * dt;

        // Walls stop the body dead on the axis it hit.
        let bound = vec3(ARENA_HALF_EXTENT, 0.0, ARENA_HALF_EXTENT);
        let clamped = position.clamp(-bound, bound);
        if clamped.x != position.x {
            velocity.x = 0.0;
        }
        if clamped.z != position.z {
            velocity.z = 0.0;
        }

        Self {
            position: clamped,
            velocity,
        }
    }
}

/// A body driven at a fixed tick rate, with its inputs recorded per tick and
/// periodic snapshots that pass through a lossy, 16-bit-tick "wire".
pub struct Simulation {
    tick: Tick,
    body: BodyState,
    dt: f32,
    drop_rate: f64,
    dropped: u64,
    inputs: InputHistory,
    snapshots: SnapshotHistory,
    trail: PositionTrail,
    rng: StdRng,
    frame_alpha: f32, // How far real time has got into the next tick.
    pub steering: PlayerInput,
    pub paused: bool,
    pub snapshot_interval: u32,
    pub interpolation_delay: u32,
}

impl Simulation {
    pub fn new(config: &Config, seed: u64) -> Self {
        Self {
            tick: 0,
            body: BodyState::default(),
            dt: 1.0 / config.tick_rate,
            drop_rate: config.drop_rate,
            dropped: 0,
            inputs: InputHistory::new(),
            snapshots: SnapshotHistory::new(),
            trail: PositionTrail::new(),
            rng: StdRng::seed_from_u64(seed),
            frame_alpha: 0.0,
            steering: PlayerInput::default(),
            paused: false,
            snapshot_interval: config.snapshot_interval.max(1),
            interpolation_delay: config.interpolation_delay,
        }
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn body(&self) -> &BodyState {
        &self.body
    }

    pub fn inputs(&self) -> &InputHistory {
        &self.inputs
    }

    pub fn snapshots(&self) -> &SnapshotHistory {
        &self.snapshots
    }

    pub fn trail(&self) -> &PositionTrail {
        &self.trail
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn drop_rate(&self) -> f64 {
        self.drop_rate
    }

    /// Returns false, leaving the rate unchanged, outside `[0, 1)`.
    pub fn set_drop_rate(&mut self, drop_rate: f64) -> bool {
        if (0.0..1.0).contains(&drop_rate) {
            self.drop_rate = drop_rate;
            true
        } else {
            false
        }
    }

    /// Simulates one tick with the current steering. Does nothing while paused.
    pub fn step(&mut self) -> bool {
        if self.paused {
            return false;
        }

        self.tick += 1;
        let input = self.steering;
        self.inputs.push(input, self.tick);
        self.body = self.body.advance(&input, self.dt);
        self.trail.push(self.body.position);

        if self.tick % Tick::from(self.snapshot_interval) == 0 {
            self.send_snapshot();
        }

        true
    }

    fn send_snapshot(&mut self) {
        if self.rng.random_bool(self.drop_rate) {
            self.dropped += 1;
            debug!(tick = self.tick, "snapshot lost in transit");
            return;
        }

        self.receive_snapshot(wire::wire_id(self.tick), self.body);
    }

    /// Stores a snapshot that arrived with a 16-bit tick id.
    pub fn receive_snapshot(&mut self, id: u16, state: BodyState) {
        let reference = self.snapshots.last_tick().unwrap_or(self.tick);
        let Some(tick) = wire::widen(reference, id) else {
            warn!(id, reference, "snapshot id cannot be widened; discarding");
            return;
        };

        if let Err(error) = self.snapshots.push(tick, state) {
            debug!(%error, "discarding out-of-order snapshot");
        }
    }

    /// Position blended between the snapshots around `tick + fraction`.
    pub fn interpolated(&self, tick: Tick, fraction: f32) -> Option<Vec3> {
        let bracket = self.snapshots.bracket(tick, fraction)?;
        let (low, high) = self.snapshots.states(&bracket)?;
        Some(low.position.lerp(high.position, bracket.fraction))
    }

    pub fn frame_alpha(&self) -> f32 {
        self.frame_alpha
    }

    pub fn set_frame_alpha(&mut self, alpha: f32) {
        self.frame_alpha = alpha.clamp(0.0, 1.0);
    }

    /// What a remote observer would draw now: the interpolated position
    /// `interpolation_delay` ticks in the past.
    pub fn view(&self, alpha: f32) -> Option<Vec3> {
        self.interpolated(self.tick - Tick::from(self.interpolation_delay), alpha)
    }

    /// Replaces the recorded input for a tick still in the input history.
    pub fn amend_input(&mut self, tick: Tick, input: PlayerInput) -> bool {
        if !self.inputs.is_valid_tick(tick) {
            return false;
        }
        self.inputs.set(input, tick);
        true
    }

    /// Restores the snapshot recorded at `tick` and replays the recorded
    /// inputs up to the current tick. Returns the number of ticks replayed, or
    /// `None` if there is no snapshot at `tick` or an input is missing.
    pub fn rewind(&mut self, tick: Tick) -> Option<u32> {
        let mut body = *self.snapshots.get(tick)?;
        let mut replayed = 0;

        for replay_tick in tick + 1..=self.tick {
            let input = self.inputs.get(replay_tick)?;
            body = body.advance(input, self.dt);
            replayed += 1;
        }

        self.body = body;
        Some(replayed)
    }

    pub fn clear_history(&mut self) {
        self.inputs.clear();
        self.snapshots.clear();
        self.trail.clear();
    }

    pub fn replace_trail(&mut self, trail: PositionTrail) {
        self.trail = trail;
    }
}
