use std::collections::VecDeque;

use crate::ui::{Ui, UiEvent, UiInputError};

/// Scripted stand-in for the terminal.
#[derive(Debug, Default)]
pub struct MockUi {
    /// Returned by `poll_input`, front first. Once empty, polling reports a
    /// disconnect so loops under test always terminate.
    pub events: VecDeque<Result<Option<UiEvent>, UiInputError>>,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    /// The prompt's contents as last set through `replace_input`.
    pub input_line: String,
}

impl MockUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Result<Option<UiEvent>, UiInputError>>,
    {
        Self {
            events: events.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl Ui for MockUi {
    fn show_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn poll_input(&mut self, _limit: usize) -> Result<Option<UiEvent>, UiInputError> {
        self.events
            .pop_front()
            .unwrap_or(Err(UiInputError::Disconnected))
    }

    fn replace_input(&mut self, line: &str) {
        self.input_line = line.to_string();
    }
}
