use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use console::{Console, ConsoleError, Outcome, input::MAX_LINE_BYTES};
use tracing::{debug, info};

use crate::{
    commands,
    config::Config,
    sim::Simulation,
    time::TickClock,
    ui::{TerminalUi, Ui, UiEvent, UiInputError},
};

const MAX_POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Everything the loop owns besides the terminal.
pub struct Session {
    pub console: Console<Simulation>,
    pub sim: Simulation,
    clock: TickClock,
    recall: Option<usize>, // How far back Up has walked into the history.
}

impl Session {
    pub fn new(config: &Config, seed: u64) -> Self {
        let sim = Simulation::new(config, seed);
        let mut console = Console::new();
        commands::register(&mut console, &sim);

        Self {
            console,
            sim,
            clock: TickClock::new(config.tick_duration()),
            recall: None,
        }
    }

    pub fn handle_event(&mut self, ui: &mut dyn Ui, event: UiEvent) {
        match event {
            UiEvent::Submit(line) => {
                self.recall = None;
                let now = self.sim.tick();
                let result = self.console.execute(&mut self.sim, &line, now);
                self.report(ui, result);
            }
            UiEvent::Complete(line) => self.complete(ui, &line),
            UiEvent::RecallOlder => {
                let back = self.recall.map_or(0, |back| back + 1);
                if let Some(line) = self.console.recall(back) {
                    ui.replace_input(line);
                    self.recall = Some(back);
                }
            }
            UiEvent::RecallNewer => match self.recall {
                Some(0) | None => {
                    self.recall = None;
                    ui.replace_input("");
                }
                Some(back) => {
                    if let Some(line) = self.console.recall(back - 1) {
                        ui.replace_input(line);
                    }
                    self.recall = Some(back - 1);
                }
            },
        }
    }

    /// Runs the ticks that `elapsed` real time makes due, executing deferred
    /// console lines before each one, and hands the leftover fraction of a
    /// tick to the simulation's view.
    pub fn advance(&mut self, ui: &mut dyn Ui, elapsed: Duration) -> u32 {
        let ticks = self.clock.advance(elapsed);

        for _ in 0..ticks {
            let now = self.sim.tick();
            for result in self.console.run_due(&mut self.sim, now) {
                self.report(ui, result);
            }
            self.sim.step();
        }
        self.sim.set_frame_alpha(self.clock.alpha());

        ticks
    }

    fn complete(&mut self, ui: &mut dyn Ui, line: &str) {
        // Only the command name is completed.
        if line.trim_start().contains(char::is_whitespace) {
            return;
        }

        let completion = self.console.complete(line.trim_start());
        match completion.candidates.as_slice() {
            [] => {}
            [only] => ui.replace_input(&format!("{only} ")),
            candidates => {
                ui.show_message(&candidates.join("  "));
                ui.replace_input(&completion.common_prefix);
            }
        }
    }

    fn report(&mut self, ui: &mut dyn Ui, result: Result<Outcome, ConsoleError>) {
        match result {
            Ok(outcome) => {
                if let Outcome::Assigned { name, .. } = &outcome {
                    let applied = commands::apply_variable(&mut self.console, &mut self.sim, name);
                    if let Err(error) = applied {
                        ui.show_error(&error.to_string());
                        return;
                    }
                }
                if let Some(message) = outcome.message() {
                    ui.show_message(&message);
                }
            }
            Err(error) => ui.show_error(&error.to_string()),
        }
    }
}

pub fn run(config: Config, running: Arc<AtomicBool>) -> Result<(), UiInputError> {
    let poll_timeout = config.tick_duration().min(MAX_POLL_TIMEOUT);
    let mut ui = TerminalUi::new(poll_timeout)?;
    let mut session = Session::new(&config, rand::random());

    ui.show_message("Type 'help' for commands. Ctrl-C quits.");
    info!(?config, "sandbox started");

    let result = session_loop(&mut ui, &mut session, &running);
    info!(tick = session.sim.tick(), "sandbox stopped");
    result
}

fn session_loop(
    ui: &mut dyn Ui,
    session: &mut Session,
    running: &AtomicBool,
) -> Result<(), UiInputError> {
    let mut last_updated = Instant::now();

    while running.load(Ordering::SeqCst) {
        match ui.poll_input(MAX_LINE_BYTES) {
            Ok(Some(event)) => session.handle_event(ui, event),
            Ok(None) => {}
            Err(UiInputError::Disconnected) => {
                debug!("input closed");
                return Ok(());
            }
            Err(error) => return Err(error),
        }

        let now = Instant::now();
        session.advance(ui, now - last_updated);
        last_updated = now;
    }

    Ok(())
}
