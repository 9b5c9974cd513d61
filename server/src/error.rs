//! Error types for the session coordinator

use shared::ServerEvent;
use thiserror::Error;

/// A command that cannot be carried out. Only the requester hears about it
/// and no state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no game with code {0}")]
    NoSuchGame(String),

    #[error("name {0:?} is already taken")]
    NameTaken(String),

    #[error("game {0} has no identities left")]
    GameFull(String),

    #[error("too many concurrent games")]
    TooManyGames,

    #[error("game code {0} is already in use")]
    CodeCollision(String),
}

impl GameError {
    /// Reply for the requester, if the client has a frame for this error
    pub fn reply(&self) -> Option<ServerEvent> {
        match self {
            GameError::NoSuchGame(code) => Some(ServerEvent::NoSuchGame { code: code.clone() }),
            GameError::NameTaken(name) => Some(ServerEvent::NameTaken { name: name.clone() }),
            GameError::GameFull(code) => Some(ServerEvent::GameFull { code: code.clone() }),
            GameError::TooManyGames => Some(ServerEvent::TooManyGames),
            GameError::CodeCollision(_) => None,
        }
    }
}

/// Shared state that can only follow a logic bug. The process must stop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("game {code} has {} seekers: {}", .names.len(), .names.join(", "))]
    MultipleSeekers { code: String, names: Vec<String> },

    #[error("seeker {name:?} of game {code} is still waiting to join")]
    PendingSeeker { code: String, name: String },
}

/// Failures at the process boundary
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for process-level operations
pub type Result<T> = std::result::Result<T, ServerError>;
