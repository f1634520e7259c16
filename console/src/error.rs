use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("'{command}' expects a {argument} argument")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },
    #[error("invalid {argument} '{value}'")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },
    #[error("too many deferred commands (limit {limit})")]
    QueueFull { limit: usize },
    #[error("{0}")]
    Command(String),
}
