pub mod commands;
pub mod config;
pub mod constants;
pub mod run;
pub mod sim;
pub mod time;
pub mod ui;

#[cfg(test)]
mod test_helpers;
