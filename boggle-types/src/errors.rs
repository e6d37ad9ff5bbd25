use thiserror::Error;

/// Error taxonomy shared by the session registry and the HTTP layer.
///
/// Every recoverable condition is a distinct variant so callers receive a
/// typed error rather than a retried or swallowed one. `Persistence` is the
/// only fatal variant: it aborts the current operation's transaction and is
/// surfaced to clients as a generic server error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("nickname must be 1-50 characters")]
    InvalidNickname,
    #[error("time limit {0} is outside the allowed range")]
    InvalidTimeLimit(i32),
    #[error("word must be non-empty and at most 30 characters")]
    InvalidWord,
    #[error("unknown user token")]
    UnknownToken,
    #[error("unknown game {0}")]
    UnknownGame(String),
    #[error("user already occupies a slot in an open game")]
    AlreadyInGame,
    #[error("game is not active")]
    GameNotActive,
    #[error("player is not part of this game")]
    PlayerNotInGame,
    #[error("no pending game to cancel")]
    NoPendingGame,
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl SessionError {
    /// Wraps a backing-store failure. The detail is kept for logs; the HTTP
    /// layer never exposes it to clients.
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        SessionError::Persistence(err.to_string())
    }

    /// True for the fatal variant that must roll back the current transaction.
    pub fn is_persistence(&self) -> bool {
        matches!(self, SessionError::Persistence(_))
    }
}
