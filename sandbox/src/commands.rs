use std::{fmt::Write, fs, str::FromStr};

use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};
use console::{Console, ConsoleError};
use glam::Vec3;
use history::{RingState, Tick};

use crate::sim::{PlayerInput, PositionTrail, Simulation};

pub const DROP_RATE: &str = "drop_rate";
pub const DELAY: &str = "delay";
pub const INTERVAL: &str = "interval";

/// Registers the sandbox's commands and variables.
pub fn register(console: &mut Console<Simulation>, sim: &Simulation) {
    console.register("status", "show the tick, body and history windows", status);
    console.register("input", "input <tick>: show the recorded input", input);
    console.register("snapshot", "snapshot <tick>: show a stored snapshot", snapshot);
    console.register(
        "interp",
        "interp <tick> [fraction]: blend the snapshots around a point",
        interp,
    );
    console.register("steer", "steer [forward|backward|left|right]...: hold keys", steer);
    console.register(
        "amend",
        "amend <tick> [keys...]: rewrite a recorded input",
        amend,
    );
    console.register(
        "rewind",
        "rewind <tick>: restore a snapshot and replay inputs since",
        rewind,
    );
    console.register("clear", "forget all recorded history", |sim: &mut Simulation, _: &[String]| {
        sim.clear_history();
        Ok(Some("history cleared".to_string()))
    });
    console.register("pause", "stop advancing ticks", |sim: &mut Simulation, _: &[String]| {
        sim.paused = true;
        Ok(Some(format!("paused at tick {}", sim.tick())))
    });
    console.register("resume", "continue advancing ticks", |sim: &mut Simulation, _: &[String]| {
        sim.paused = false;
        Ok(None)
    });
    console.register("save", "save <path>: write the position trail to a file", save);
    console.register("load", "load <path>: read a position trail from a file", load);

    console.register_variable(DROP_RATE, "probability a snapshot is lost", sim.drop_rate());
    console.register_variable(DELAY, "ticks the view trails the simulation", sim.interpolation_delay);
    console.register_variable(INTERVAL, "ticks between snapshots", sim.snapshot_interval);
}

/// Pushes a variable the console just assigned into the simulation. On a bad
/// value the console is rolled back to the simulation's current setting.
pub fn apply_variable(
    console: &mut Console<Simulation>,
    sim: &mut Simulation,
    name: &str,
) -> Result<(), ConsoleError> {
    let applied = match name {
        DROP_RATE => console
            .parse_variable::<f64>(name)
            .is_ok_and(|rate| sim.set_drop_rate(rate)),
        DELAY => console
            .parse_variable::<u32>(name)
            .map(|delay| sim.interpolation_delay = delay)
            .is_ok(),
        INTERVAL => console
            .parse_variable::<u32>(name)
            .ok()
            .filter(|&interval| interval > 0)
            .map(|interval| sim.snapshot_interval = interval)
            .is_some(),
        _ => return Ok(()),
    };

    if applied {
        return Ok(());
    }

    let value = console.variable(name).unwrap_or_default().to_string();
    let current = match name {
        DROP_RATE => sim.drop_rate().to_string(),
        DELAY => sim.interpolation_delay.to_string(),
        _ => sim.snapshot_interval.to_string(),
    };
    console.set_variable(name, current)?;

    Err(ConsoleError::InvalidArgument {
        argument: "value",
        value,
    })
}

fn status(sim: &mut Simulation, _: &[String]) -> Result<Option<String>, ConsoleError> {
    let mut output = String::new();
    let body = sim.body();

    let _ = writeln!(
        output,
        "tick {}{}",
        sim.tick(),
        if sim.paused { " (paused)" } else { "" }
    );
    let _ = writeln!(
        output,
        "position {} velocity {}",
        format_vec(body.position),
        format_vec(body.velocity)
    );
    let _ = writeln!(
        output,
        "view {} ({} ticks behind)",
        sim.view(sim.frame_alpha()).map_or_else(|| "unavailable".to_string(), format_vec),
        sim.interpolation_delay
    );
    let _ = writeln!(
        output,
        "inputs {} ({}/{})",
        window(sim.inputs().first_tick(), sim.inputs().last_tick()),
        sim.inputs().len(),
        sim.inputs().capacity()
    );
    let _ = writeln!(
        output,
        "snapshots {} ({}/{}, {} dropped)",
        window(sim.snapshots().first_tick(), sim.snapshots().last_tick()),
        sim.snapshots().len(),
        sim.snapshots().capacity(),
        sim.dropped()
    );
    let _ = write!(
        output,
        "trail {}/{}",
        sim.trail().len(),
        sim.trail().capacity()
    );

    Ok(Some(output))
}

fn input(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let tick: Tick = parse_arg(args, 0, "input", "tick")?;
    match sim.inputs().get(tick) {
        Some(input) => Ok(Some(format!("tick {tick}: {input}"))),
        None => Err(ConsoleError::Command(format!(
            "no input recorded for tick {tick}"
        ))),
    }
}

fn snapshot(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let tick: Tick = parse_arg(args, 0, "snapshot", "tick")?;
    match sim.snapshots().get(tick) {
        Some(state) => Ok(Some(format!(
            "tick {tick}: position {} velocity {}",
            format_vec(state.position),
            format_vec(state.velocity)
        ))),
        None => Err(ConsoleError::Command(format!("no snapshot stored for tick {tick}"))),
    }
}

fn interp(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let tick: Tick = parse_arg(args, 0, "interp", "tick")?;
    let fraction: f32 = match args.get(1) {
        Some(_) => parse_arg(args, 1, "interp", "fraction")?,
        None => 0.0,
    };

    let bracket = sim.snapshots().bracket(tick, fraction).ok_or_else(|| {
        ConsoleError::Command(format!(
            "tick {tick} is outside the snapshot window {}",
            window(sim.snapshots().first_tick(), sim.snapshots().last_tick())
        ))
    })?;
    let position = sim
        .interpolated(tick, fraction)
        .ok_or_else(|| ConsoleError::Command("bracket has no samples".to_string()))?;

    Ok(Some(format!(
        "between ticks {} and {} at {:.3}: {}",
        bracket.low_tick,
        bracket.high_tick,
        bracket.fraction,
        format_vec(position)
    )))
}

fn steer(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    sim.steering = parse_keys(args)?;
    Ok(Some(format!("steering {}", sim.steering)))
}

fn amend(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let tick: Tick = parse_arg(args, 0, "amend", "tick")?;
    let input = parse_keys(&args[1..])?;

    if sim.amend_input(tick, input) {
        Ok(Some(format!("tick {tick} now {input}")))
    } else {
        Err(ConsoleError::Command(format!(
            "tick {tick} is outside the input window {}",
            window(sim.inputs().first_tick(), sim.inputs().last_tick())
        )))
    }
}

fn rewind(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let tick: Tick = parse_arg(args, 0, "rewind", "tick")?;

    match sim.rewind(tick) {
        Some(replayed) => Ok(Some(format!(
            "replayed {replayed} ticks from tick {tick}; position {}",
            format_vec(sim.body().position)
        ))),
        None => Err(ConsoleError::Command(format!(
            "cannot rewind to tick {tick}: no snapshot there or inputs since are missing"
        ))),
    }
}

fn save(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let path: String = parse_arg(args, 0, "save", "path")?;

    let bytes = encode_to_vec(sim.trail().to_state(), standard())
        .map_err(|error| ConsoleError::Command(format!("failed to encode trail: {error}")))?;
    fs::write(&path, &bytes)
        .map_err(|error| ConsoleError::Command(format!("failed to write {path}: {error}")))?;

    Ok(Some(format!(
        "saved {} positions to {path}",
        sim.trail().len()
    )))
}

fn load(sim: &mut Simulation, args: &[String]) -> Result<Option<String>, ConsoleError> {
    let path: String = parse_arg(args, 0, "load", "path")?;

    let bytes = fs::read(&path)
        .map_err(|error| ConsoleError::Command(format!("failed to read {path}: {error}")))?;
    let (state, _): (RingState<Vec3>, usize) = decode_from_slice(&bytes, standard())
        .map_err(|error| ConsoleError::Command(format!("failed to decode {path}: {error}")))?;
    let trail = PositionTrail::from_state(state)
        .map_err(|error| ConsoleError::Command(format!("{path} is not a trail: {error}")))?;

    let len = trail.len();
    sim.replace_trail(trail);
    Ok(Some(format!("loaded {len} positions from {path}")))
}

fn parse_arg<T: FromStr>(
    args: &[String],
    index: usize,
    command: &str,
    argument: &'static str,
) -> Result<T, ConsoleError> {
    let value = args.get(index).ok_or_else(|| ConsoleError::MissingArgument {
        command: command.to_string(),
        argument,
    })?;
    value.parse().map_err(|_| ConsoleError::InvalidArgument {
        argument,
        value: value.clone(),
    })
}

fn parse_keys(args: &[String]) -> Result<PlayerInput, ConsoleError> {
    let mut input = PlayerInput::default();

    for key in args {
        match key.to_lowercase().as_str() {
            "forward" | "w" => input.forward = true,
            "backward" | "s" => input.backward = true,
            "left" | "a" => input.left = true,
            "right" | "d" => input.right = true,
            _ => {
                return Err(ConsoleError::InvalidArgument {
                    argument: "key",
                    value: key.clone(),
                });
            }
        }
    }

    Ok(input)
}

fn window(first: Option<Tick>, last: Option<Tick>) -> String {
    match (first, last) {
        (Some(first), Some(last)) => format!("[{first}, {last}]"),
        _ => "empty".to_string(),
    }
}

fn format_vec(v: Vec3) -> String {
    format!("({:.1}, {:.1}, {:.1})", v.x, v.y, v.z)
}
