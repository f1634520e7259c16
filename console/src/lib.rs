//! Line-oriented command console: tokenizing, dispatch to registered commands
//! and variables, bounded history, tab completion, and `wait`-deferred lines.
//!
//! All state lives in a [`Console`] value owned by the caller.

pub mod dispatch;
pub mod error;
pub mod input;
pub mod tokenize;

pub use dispatch::{Completion, Console, Outcome};
pub use error::ConsoleError;

pub const CONSOLE_HISTORY_LENGTH: usize = 32;
pub const MAX_DEFERRED_COMMANDS: usize = 64;
