//! Othello (Reversi) rules engine and two-agent RL environment
//!
//! - [`board`]: the 8x8 grid, move legality, flipping and scoring
//! - [`state`]: whose turn it is, including forced passes and game over
//! - [`env`]: the per-ply turn controller with rewards and episode handling
//!
//! Python bindings live behind the `python` feature.

use std::fmt;
use std::str::FromStr;

pub mod board;
pub mod config;
pub mod env;
pub mod error;
pub mod state;

// PyO3 bindings module
#[cfg(feature = "python")]
pub mod bindings;

pub use board::{Board, Move, BOARD_SIZE, NUM_CELLS};
pub use config::EnvConfig;
pub use env::{Observation, OthelloEnv, ResetOptions, Rewards, StepInfo, StepResult};
pub use error::GameError;
pub use state::{GameState, Ply, TurnAdvance};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Player {
    White,
    Black,
}

impl Player {
    /// Both players, in turn order
    pub const ALL: [Player; 2] = [Player::White, Player::Black];

    /// Get the opponent player
    pub fn opponent(&self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Convert player to cell representation
    pub fn to_cell(&self) -> Cell {
        match self {
            Player::White => Cell::White,
            Player::Black => Cell::Black,
        }
    }

    /// Agent id used as the key of per-player maps
    pub fn agent_id(&self) -> &'static str {
        match self {
            Player::White => "white",
            Player::Black => "black",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_id())
    }
}

impl FromStr for Player {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" => Ok(Player::White),
            "black" => Ok(Player::Black),
            other => Err(GameError::UnknownAgent(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    White,
    Black,
}

impl Cell {
    /// The player occupying this cell, if any
    pub fn owner(&self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::White => Some(Player::White),
            Cell::Black => Some(Player::Black),
        }
    }

    /// Numeric code: 0 = empty, 1 = white, 2 = black
    pub fn code(&self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::White => 1,
            Cell::Black => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::Black.opponent(), Player::White);
        assert_eq!(Player::White.opponent(), Player::Black);
    }

    #[test]
    fn test_player_to_cell() {
        assert_eq!(Player::Black.to_cell(), Cell::Black);
        assert_eq!(Player::White.to_cell(), Cell::White);
        assert_eq!(Player::White.to_cell().owner(), Some(Player::White));
        assert_eq!(Cell::Empty.owner(), None);
    }

    #[test]
    fn test_agent_ids_round_trip() {
        for player in Player::ALL {
            assert_eq!(player.agent_id().parse::<Player>(), Ok(player));
        }
        assert_eq!(
            "red".parse::<Player>(),
            Err(GameError::UnknownAgent("red".to_string()))
        );
    }

    #[test]
    fn test_cell_codes() {
        assert_eq!(Cell::Empty.code(), 0);
        assert_eq!(Cell::White.code(), 1);
        assert_eq!(Cell::Black.code(), 2);
    }
}
