use std::{env, fs};

use console::{ConsoleError, Outcome};
use sandbox::{config::Config, run::Session};

fn lossless_session() -> Session {
    let config = Config {
        drop_rate: 0.0,
        ..Config::default()
    };
    Session::new(&config, 11)
}

fn step(session: &mut Session, ticks: u32) {
    for _ in 0..ticks {
        let now = session.sim.tick();
        for result in session.console.run_due(&mut session.sim, now) {
            result.expect("deferred command should succeed");
        }
        session.sim.step();
    }
}

fn run(session: &mut Session, line: &str) -> Result<Outcome, ConsoleError> {
    let now = session.sim.tick();
    session.console.execute(&mut session.sim, line, now)
}

#[test]
fn rewinding_through_the_console_reproduces_the_live_body() {
    let mut session = lossless_session();
    run(&mut session, "steer forward left").expect("steer should succeed");
    step(&mut session, 12);
    let live = *session.sim.body();

    let outcome = run(&mut session, "rewind 6").expect("snapshot 6 should be stored");

    let message = outcome.message().expect("rewind reports what it did");
    assert!(message.starts_with("replayed 6 ticks from tick 6"));
    assert_eq!(*session.sim.body(), live);
}

#[test]
fn deferred_steering_takes_effect_on_its_tick() {
    let mut session = lossless_session();

    assert_eq!(
        run(&mut session, "wait 4 steer right"),
        Ok(Outcome::Scheduled { due: 4 })
    );
    step(&mut session, 8);

    let inputs = session.sim.inputs();
    assert!(!inputs.get(4).expect("tick 4 recorded").right);
    assert!(inputs.get(5).expect("tick 5 recorded").right);
    assert_eq!(session.console.pending(), 0);
}

#[test]
fn saved_trail_survives_a_clear() {
    let mut session = lossless_session();
    let path = env::temp_dir().join(format!("sandbox-trail-{}.bin", std::process::id()));
    let path = path.to_string_lossy().to_string();

    run(&mut session, "steer backward").expect("steer should succeed");
    step(&mut session, 12);
    let recorded: Vec<_> = session.sim.trail().iter().copied().collect();

    run(&mut session, &format!("save \"{path}\"")).expect("save should succeed");
    run(&mut session, "clear").expect("clear should succeed");
    assert!(session.sim.trail().is_empty());

    let loaded = run(&mut session, &format!("load \"{path}\"")).expect("load should succeed");
    fs::remove_file(&path).ok();

    assert_eq!(
        loaded.message(),
        Some(format!("loaded 12 positions from {path}"))
    );
    assert_eq!(session.sim.trail().iter().copied().collect::<Vec<_>>(), recorded);
}

#[test]
fn interpolation_reports_the_bracketing_snapshots() {
    let mut session = lossless_session();
    step(&mut session, 9);

    let outcome = run(&mut session, "interp 4 0.5").expect("tick 4 lies between snapshots");
    let message = outcome.message().expect("interp reports a position");

    assert!(message.starts_with("between ticks 3 and 6 at 0.500"));
    assert!(matches!(
        run(&mut session, "interp 40"),
        Err(ConsoleError::Command(_))
    ));
}
