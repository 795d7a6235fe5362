use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Update carries no message")]
    NoMessage,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, DbotError>;
