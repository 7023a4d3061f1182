//! Error taxonomy for the rules engine and the episode surface

use crate::Player;

/// Errors raised while validating or applying a move
///
/// Inside an episode every one of these is terminal: the environment turns
/// them into a penalty for [`GameError::offender`] and ends the episode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("move submitted for the wrong player, it is {expected}'s turn")]
    InvalidActor {
        expected: Player,
        actor: Option<Player>,
    },
    #[error("{player} cannot place a piece at column {col}, row {row}")]
    IllegalMove { col: usize, row: usize, player: Player },
    #[error("action index {index} is off the board (expected 0..64)")]
    OutOfRange { index: i64 },
    #[error("episode is already over, call reset first")]
    EpisodeOver,
    #[error("unknown agent id: {0:?} (expected \"white\" or \"black\")")]
    UnknownAgent(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid board text: {0}")]
    ParseBoard(String),
}

impl GameError {
    /// The player that should be penalized for this error, if any.
    ///
    /// An empty action map has no submitting actor, so the player who failed
    /// to act takes the penalty.
    pub fn offender(&self) -> Option<Player> {
        match self {
            GameError::InvalidActor { expected, actor } => Some(actor.unwrap_or(*expected)),
            GameError::IllegalMove { player, .. } => Some(*player),
            GameError::OutOfRange { .. }
            | GameError::EpisodeOver
            | GameError::UnknownAgent(_)
            | GameError::Config(_)
            | GameError::ParseBoard(_) => None,
        }
    }
}
