//! Errors produced by the rules kernel.

/// Errors that can occur while parsing or validating chess input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The FEN string could not be parsed into a valid position.
    #[error("invalid FEN: {reason}")]
    InvalidFen {
        /// What made the string unacceptable.
        reason: String,
    },

    /// A move string was well formed but does not name a legal move.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A move string was not in coordinate (UCI) form.
    #[error("invalid move format: {0}")]
    InvalidMoveFormat(String),
}

impl EngineError {
    pub(crate) fn fen(reason: impl Into<String>) -> Self {
        Self::InvalidFen {
            reason: reason.into(),
        }
    }
}
