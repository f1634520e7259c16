use std::{collections::BTreeMap, fmt::Write, str::FromStr};

use history::{FixedRing, Tick};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, warn};

use crate::{CONSOLE_HISTORY_LENGTH, MAX_DEFERRED_COMMANDS, error::ConsoleError, tokenize::tokenize};

type Handler<C> = Box<dyn FnMut(&mut C, &[String]) -> Result<Option<String>, ConsoleError>>;

struct Command<C> {
    description: String,
    handler: Handler<C>,
}

struct Variable {
    description: String,
    value: String,
}

struct Deferred {
    due: Tick,
    tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Builtin {
    Help,
    History,
    Vars,
    Wait,
}

impl Builtin {
    fn description(&self) -> &'static str {
        match self {
            Builtin::Help => "list commands and variables",
            Builtin::History => "show recently entered lines",
            Builtin::Vars => "show every variable and its value",
            Builtin::Wait => "wait <ticks> <command...>: run a command later",
        }
    }
}

/// What a successfully executed line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Empty,
    Ran(Option<String>),
    Read { name: String, value: String },
    Assigned { name: String, value: String },
    Scheduled { due: Tick },
}

impl Outcome {
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Empty | Outcome::Ran(None) => None,
            Outcome::Ran(Some(output)) => Some(output.clone()),
            Outcome::Read { name, value } => Some(format!("{name} = {value}")),
            Outcome::Assigned { name, value } => Some(format!("{name} set to {value}")),
            Outcome::Scheduled { due } => Some(format!("scheduled for tick {due}")),
        }
    }
}

/// Names that start with a prefix, and the longest prefix they all share.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub candidates: Vec<String>,
    pub common_prefix: String,
}

/// Command table, variables, line history and deferred lines for a context
/// of type `C`, which every handler receives mutably.
pub struct Console<C> {
    commands: BTreeMap<String, Command<C>>,
    variables: BTreeMap<String, Variable>,
    history: FixedRing<String, CONSOLE_HISTORY_LENGTH>,
    deferred: Vec<Deferred>, // Sorted by due tick, then submission order.
}

impl<C> Console<C> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
            variables: BTreeMap::new(),
            history: FixedRing::new(),
            deferred: Vec::new(),
        }
    }

    /// Registers a command. Names are case-insensitive; a later registration
    /// under the same name replaces the earlier one.
    pub fn register<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: FnMut(&mut C, &[String]) -> Result<Option<String>, ConsoleError> + 'static,
    {
        let key = name.to_lowercase();
        if key.parse::<Builtin>().is_ok() {
            warn!(name, "command is shadowed by a builtin and will never run");
        }

        self.commands.insert(
            key,
            Command {
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
    }

    pub fn register_variable(&mut self, name: &str, description: &str, initial: impl ToString) {
        self.variables.insert(
            name.to_lowercase(),
            Variable {
                description: description.to_string(),
                value: initial.to_string(),
            },
        );
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .get(&name.to_lowercase())
            .map(|variable| variable.value.as_str())
    }

    pub fn set_variable(&mut self, name: &str, value: impl ToString) -> Result<(), ConsoleError> {
        let variable = self
            .variables
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| ConsoleError::UnknownVariable(name.to_string()))?;
        variable.value = value.to_string();
        Ok(())
    }

    pub fn parse_variable<T: FromStr>(&self, name: &str) -> Result<T, ConsoleError> {
        let value = self
            .variable(name)
            .ok_or_else(|| ConsoleError::UnknownVariable(name.to_string()))?;
        value.parse().map_err(|_| ConsoleError::InvalidArgument {
            argument: "variable value",
            value: value.to_string(),
        })
    }

    /// Executes a line typed at tick `now` and records it in the history.
    pub fn execute(&mut self, context: &mut C, line: &str, now: Tick) -> Result<Outcome, ConsoleError> {
        let tokens = tokenize(line);
        let Some((name, args)) = tokens.split_first() else {
            return Ok(Outcome::Empty);
        };

        self.history.push(line.trim().to_string());
        self.dispatch(context, name, args, now)
    }

    /// Runs every deferred line due at or before `now`, earliest first.
    pub fn run_due(&mut self, context: &mut C, now: Tick) -> Vec<Result<Outcome, ConsoleError>> {
        let split = self.deferred.partition_point(|deferred| deferred.due <= now);
        let due: Vec<Deferred> = self.deferred.drain(..split).collect();

        due.into_iter()
            .filter_map(|deferred| {
                let (name, args) = deferred.tokens.split_first()?;
                debug!(tick = now, command = %name, "running deferred command");
                Some(self.dispatch(context, name, args, now))
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Case-insensitive prefix match over builtins, commands and variables.
    pub fn complete(&self, prefix: &str) -> Completion {
        let prefix = prefix.to_lowercase();

        let mut candidates: Vec<String> = Builtin::iter()
            .map(|builtin| builtin.as_ref().to_string())
            .chain(self.commands.keys().cloned())
            .chain(self.variables.keys().cloned())
            .filter(|name| name.starts_with(&prefix))
            .collect();
        candidates.sort();
        candidates.dedup();

        let common_prefix = common_prefix(&candidates);
        Completion {
            candidates,
            common_prefix,
        }
    }

    /// Entered lines, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator + '_ {
        self.history.iter().map(String::as_str)
    }

    /// The line `back` entries before the newest, where 0 is the newest.
    pub fn recall(&self, back: usize) -> Option<&str> {
        let index = self.history.len().checked_sub(back.checked_add(1)?)?;
        self.history.get(index).map(String::as_str)
    }

    fn dispatch(
        &mut self,
        context: &mut C,
        name: &str,
        args: &[String],
        now: Tick,
    ) -> Result<Outcome, ConsoleError> {
        if let Ok(builtin) = name.parse::<Builtin>() {
            return self.run_builtin(builtin, args, now);
        }

        let key = name.to_lowercase();

        if let Some(command) = self.commands.get_mut(&key) {
            return (command.handler)(context, args).map(Outcome::Ran);
        }

        if let Some(variable) = self.variables.get_mut(&key) {
            return match args {
                [] => Ok(Outcome::Read {
                    name: key,
                    value: variable.value.clone(),
                }),
                [value] => {
                    variable.value = value.clone();
                    Ok(Outcome::Assigned {
                        name: key,
                        value: value.clone(),
                    })
                }
                _ => Err(ConsoleError::InvalidArgument {
                    argument: "value",
                    value: args.join(" "),
                }),
            };
        }

        Err(ConsoleError::UnknownCommand(name.to_string()))
    }

    fn run_builtin(&mut self, builtin: Builtin, args: &[String], now: Tick) -> Result<Outcome, ConsoleError> {
        match builtin {
            Builtin::Help => Ok(Outcome::Ran(Some(self.help()))),
            Builtin::History => {
                let mut output = String::new();
                for (index, line) in self.history.iter().enumerate() {
                    let _ = writeln!(output, "{:>3}  {line}", index + 1);
                }
                Ok(Outcome::Ran(Some(output.trim_end().to_string())))
            }
            Builtin::Vars => {
                let mut output = String::new();
                for (name, variable) in &self.variables {
                    let _ = writeln!(output, "{name} = {}", variable.value);
                }
                Ok(Outcome::Ran(Some(output.trim_end().to_string())))
            }
            Builtin::Wait => {
                let Some((ticks, rest)) = args.split_first() else {
                    return Err(ConsoleError::MissingArgument {
                        command: builtin.as_ref().to_string(),
                        argument: "tick count",
                    });
                };
                let ticks: u32 = ticks.parse().map_err(|_| ConsoleError::InvalidArgument {
                    argument: "tick count",
                    value: ticks.clone(),
                })?;
                if rest.is_empty() {
                    return Err(ConsoleError::MissingArgument {
                        command: builtin.as_ref().to_string(),
                        argument: "command",
                    });
                }
                if self.deferred.len() >= MAX_DEFERRED_COMMANDS {
                    return Err(ConsoleError::QueueFull {
                        limit: MAX_DEFERRED_COMMANDS,
                    });
                }

                let due = now.saturating_add(Tick::from(ticks));
                let position = self.deferred.partition_point(|deferred| deferred.due <= due);
                self.deferred.insert(
                    position,
                    Deferred {
                        due,
                        tokens: rest.to_vec(),
                    },
                );
                Ok(Outcome::Scheduled { due })
            }
        }
    }

    fn help(&self) -> String {
        let mut output = String::new();

        for builtin in Builtin::iter() {
            let _ = writeln!(output, "{:<12} {}", builtin.as_ref(), builtin.description());
        }
        for (name, command) in &self.commands {
            let _ = writeln!(output, "{name:<12} {}", command.description);
        }
        for (name, variable) in &self.variables {
            let _ = writeln!(output, "{name:<12} {} (variable)", variable.description);
        }

        output.trim_end().to_string()
    }
}

impl<C> Default for Console<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn common_prefix(candidates: &[String]) -> String {
    let Some((first, rest)) = candidates.split_first() else {
        return String::new();
    };

    let mut len = first.len();
    for candidate in rest {
        let shared: usize = first
            .chars()
            .zip(candidate.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        len = len.min(shared);
    }

    first[..len].to_string()
}
