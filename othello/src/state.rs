//! Turn tracking: handover, forced passes and game over

use crate::board::{Board, Move};
use crate::{GameError, Player};

/// What happened to the turn after a successful placement
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnAdvance {
    /// The mover's opponent is to move
    Handover,
    /// The opponent had no legal move, so the mover goes again
    ForcedPass,
    /// Neither player can move
    GameOver,
}

/// Record of one applied ply
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ply {
    pub player: Player,
    pub mv: Move,
    pub flipped: Vec<Move>,
    pub advance: TurnAdvance,
}

/// The board plus whose turn it is. White moves first.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameState {
    board: Board,
    current_player: Player,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::White,
        }
    }

    /// Resume from an arbitrary position
    pub fn from_parts(board: Board, current_player: Player) -> Self {
        GameState {
            board,
            current_player,
        }
    }

    /// Re-initialize the board in place and hand the first move to White
    pub fn reset(&mut self) {
        self.board.initialize();
        self.current_player = Player::White;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Legal moves for the player to move
    pub fn valid_moves(&self) -> Vec<Move> {
        self.board.valid_moves(self.current_player)
    }

    pub fn is_game_over(&self) -> bool {
        self.board.is_game_over()
    }

    /// Place a piece for the current player and advance the turn.
    ///
    /// An illegal move leaves both the board and the turn unchanged.
    pub fn play(&mut self, mv: Move) -> Result<Ply, GameError> {
        let player = self.current_player;
        let flipped = self
            .board
            .place(mv.col(), mv.row(), player)
            .ok_or(GameError::IllegalMove {
                col: mv.col(),
                row: mv.row(),
                player,
            })?;

        let advance = self.advance_turn(player);

        Ok(Ply {
            player,
            mv,
            flipped,
            advance,
        })
    }

    /// Hand the turn to the opponent; pass back only when the opponent is
    /// stuck and the mover is not.
    fn advance_turn(&mut self, mover: Player) -> TurnAdvance {
        let next = mover.opponent();
        self.current_player = next;

        if self.board.has_valid_move(next) {
            TurnAdvance::Handover
        } else if self.board.has_valid_move(mover) {
            self.current_player = mover;
            TurnAdvance::ForcedPass
        } else {
            TurnAdvance::GameOver
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
