use std::{
    io::{self, Stdout, Write, stdout},
    time::Duration,
};

use crossterm::{
    cursor::{MoveDown, MoveToColumn, MoveUp},
    event::{self, Event, KeyCode, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};
use thiserror::Error;
use tracing::warn;

use console::input::sanitize;

const PROMPT: &str = "> ";

#[derive(Debug, Error)]
pub enum UiInputError {
    #[error("input source disconnected")]
    Disconnected,
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// What a key press asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Submit(String),
    Complete(String),
    RecallOlder,
    RecallNewer,
}

pub trait Ui {
    fn show_message(&mut self, message: &str);
    fn show_error(&mut self, message: &str);
    fn poll_input(&mut self, limit: usize) -> Result<Option<UiEvent>, UiInputError>;
    fn replace_input(&mut self, line: &str);
}

/// Raw-mode prompt that keeps the line being typed below printed output.
pub struct TerminalUi<W: Write> {
    stdout: W,
    buffer: String,
    prompt_lines: u16,
    cols: u16,
    poll_timeout: Duration,
    is_raw_mode_owner: bool, // True except in tests.
}

impl TerminalUi<Stdout> {
    pub fn new(poll_timeout: Duration) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = stdout();
        let (cols, _) = terminal::size().unwrap_or((80, 24));
        execute!(
            stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(PROMPT)
        )?;
        Ok(Self {
            stdout,
            buffer: String::new(),
            prompt_lines: 1,
            cols,
            poll_timeout,
            is_raw_mode_owner: true,
        })
    }
}

impl<W: Write> TerminalUi<W> {
    fn clear_prompt(&mut self) -> io::Result<()> {
        if self.prompt_lines > 1 {
            queue!(self.stdout, MoveUp(self.prompt_lines - 1))?;
        }
        for line in 0..self.prompt_lines {
            queue!(self.stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            if line + 1 < self.prompt_lines {
                queue!(self.stdout, MoveDown(1))?;
            }
        }
        if self.prompt_lines > 1 {
            queue!(self.stdout, MoveUp(self.prompt_lines - 1))?;
        }
        queue!(self.stdout, MoveToColumn(0))?;
        Ok(())
    }

    fn redraw_prompt(&mut self) -> io::Result<()> {
        self.clear_prompt()?;

        let cols = usize::from(self.cols.max(1));
        let width = PROMPT.len() + self.buffer.chars().count();
        self.prompt_lines = width.max(1).div_ceil(cols) as u16;

        queue!(self.stdout, Print(PROMPT), Print(&self.buffer))?;
        self.stdout.flush()
    }

    fn print_above_prompt(&mut self, label: &str, message: &str) -> io::Result<()> {
        self.clear_prompt()?;
        for line in message.lines() {
            queue!(self.stdout, Print(label), Print(line), Print("\r\n"))?;
        }
        self.prompt_lines = 1;
        self.redraw_prompt()
    }

    fn handle_event(&mut self, event: Event, limit: usize) -> Result<Option<UiEvent>, UiInputError> {
        match event {
            Event::Key(key_event) => {
                if key_event.modifiers == KeyModifiers::CONTROL {
                    return match key_event.code {
                        KeyCode::Char('c') | KeyCode::Char('d') => Err(UiInputError::Disconnected),
                        _ => Ok(None),
                    };
                }

                match key_event.code {
                    KeyCode::Enter => {
                        let line = sanitize(&self.buffer);
                        self.buffer.clear();
                        queue!(self.stdout, Print("\r\n"))?;
                        self.prompt_lines = 1;
                        self.redraw_prompt()?;
                        Ok(Some(UiEvent::Submit(line)))
                    }
                    KeyCode::Backspace => {
                        if self.buffer.pop().is_some() {
                            self.redraw_prompt()?;
                        }
                        Ok(None)
                    }
                    KeyCode::Esc => {
                        if !self.buffer.is_empty() {
                            self.buffer.clear();
                            self.redraw_prompt()?;
                        }
                        Ok(None)
                    }
                    KeyCode::Tab => Ok(Some(UiEvent::Complete(self.buffer.clone()))),
                    KeyCode::Up => Ok(Some(UiEvent::RecallOlder)),
                    KeyCode::Down => Ok(Some(UiEvent::RecallNewer)),
                    KeyCode::Char(c) => {
                        if self.buffer.len() + c.len_utf8() <= limit {
                            self.buffer.push(c);
                            self.redraw_prompt()?;
                        }
                        Ok(None)
                    }
                    _ => Ok(None),
                }
            }
            Event::Resize(cols, _) => {
                self.cols = cols;
                self.redraw_prompt()?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

impl<W: Write> Ui for TerminalUi<W> {
    fn show_message(&mut self, message: &str) {
        if let Err(error) = self.print_above_prompt("", message) {
            warn!(%error, "failed to write to terminal");
        }
    }

    fn show_error(&mut self, message: &str) {
        if let Err(error) = self.print_above_prompt("[ERROR] ", message) {
            warn!(%error, "failed to write to terminal");
        }
    }

    fn poll_input(&mut self, limit: usize) -> Result<Option<UiEvent>, UiInputError> {
        if !event::poll(self.poll_timeout)? {
            return Ok(None);
        }

        match event::read() {
            Ok(event) => self.handle_event(event, limit),
            Err(_) => Err(UiInputError::Disconnected),
        }
    }

    fn replace_input(&mut self, line: &str) {
        self.buffer = line.to_string();
        if let Err(error) = self.redraw_prompt() {
            warn!(%error, "failed to write to terminal");
        }
    }
}

impl<W: Write> Drop for TerminalUi<W> {
    fn drop(&mut self) {
        if self.is_raw_mode_owner {
            // Only the instance that enabled raw mode may disable it, so tests
            // never touch the test runner's terminal.
            execute!(self.stdout, Print("\r\n")).ok();
            if let Err(error) = terminal::disable_raw_mode() {
                warn!(%error, "failed to disable raw mode");
            }
        }
    }
}
