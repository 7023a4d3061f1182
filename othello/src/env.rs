//! Two-agent episode surface over [`GameState`]
//!
//! One call to [`OthelloEnv::step`] is one ply by whoever holds the turn.
//! Any protocol violation (wrong actor, illegal or off-board move) ends the
//! episode with a penalty for the offending agent; there are no retries.

use std::collections::HashMap;
use std::ops::Index;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info, warn};

use crate::board::{Board, Move, BOARD_SIZE};
use crate::config::EnvConfig;
use crate::state::GameState;
use crate::{Cell, GameError, Player};

/// 8x8 grid indexed `[row][col]`
pub type Grid<T> = [[T; BOARD_SIZE]; BOARD_SIZE];

/// Per-player reward signal for one step
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rewards {
    pub white: f32,
    pub black: f32,
}

impl Rewards {
    pub fn set(&mut self, player: Player, value: f32) {
        match player {
            Player::White => self.white = value,
            Player::Black => self.black = value,
        }
    }
}

impl Index<Player> for Rewards {
    type Output = f32;

    fn index(&self, player: Player) -> &f32 {
        match player {
            Player::White => &self.white,
            Player::Black => &self.black,
        }
    }
}

/// What the agent to move sees: own and opponent planes plus the legal mask
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub agent: Player,
    /// `planes[0]` holds the agent's pieces, `planes[1]` the opponent's
    pub planes: [Grid<u8>; 2],
    pub action_mask: Grid<u8>,
}

impl Observation {
    pub fn from_state(state: &GameState) -> Self {
        let agent = state.current_player();
        let board = state.board();
        let mut planes = [[[0u8; BOARD_SIZE]; BOARD_SIZE]; 2];

        for mv in Move::all() {
            match board.cell(mv).owner() {
                Some(owner) if owner == agent => planes[0][mv.row()][mv.col()] = 1,
                Some(_) => planes[1][mv.row()][mv.col()] = 1,
                None => {}
            }
        }

        Observation {
            agent,
            planes,
            action_mask: board.action_mask(agent),
        }
    }

    /// Flat indices set in the action mask
    pub fn legal_actions(&self) -> Vec<usize> {
        legal_actions(&self.action_mask)
    }
}

/// Counts and boards around the last step, keyed by the agent to move
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepInfo {
    pub agent: Player,
    pub white_count: usize,
    pub black_count: usize,
    pub board: Grid<Cell>,
    pub before_board: Grid<Cell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub rewards: Rewards,
    pub terminated: bool,
    /// Episodes end only by termination; kept for the gym step shape
    pub truncated: bool,
    pub info: StepInfo,
    /// Why the step was rejected, if it was
    pub error: Option<GameError>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Number of random legal plies to pre-play before handing over control
    pub offset: Option<u32>,
}

/// Terminal reward from final piece counts: `(own - other + 4) // 5`,
/// rounded toward negative infinity.
pub fn terminal_reward(own: usize, other: usize) -> f32 {
    (own as i32 - other as i32 + 4).div_euclid(5) as f32
}

fn legal_actions(mask: &Grid<u8>) -> Vec<usize> {
    Move::all()
        .filter(|mv| mask[mv.row()][mv.col()] != 0)
        .map(|mv| mv.index())
        .collect()
}

/// Build a step action map from agent ids.
///
/// Ids that are not `"white"` or `"black"` are dropped with a warning, so a
/// map without the agent to move still reaches [`OthelloEnv::step`] and is
/// penalized there.
pub fn actions_from_ids<I, S>(actions: I) -> HashMap<Player, i64>
where
    I: IntoIterator<Item = (S, i64)>,
    S: AsRef<str>,
{
    actions
        .into_iter()
        .filter_map(|(id, index)| match id.as_ref().parse::<Player>() {
            Ok(player) => Some((player, index)),
            Err(error) => {
                warn!(%error, "ignoring action");
                None
            }
        })
        .collect()
}

/// Pick a uniformly random flat index among the cells set in `mask`
pub fn sample_action<R: Rng + ?Sized>(mask: &Grid<u8>, rng: &mut R) -> Option<i64> {
    legal_actions(mask).choose(rng).map(|&index| index as i64)
}

#[derive(Debug)]
pub struct OthelloEnv {
    state: GameState,
    config: EnvConfig,
    rng: ChaCha20Rng,
    terminated: bool,
    before_board: Grid<Cell>,
}

impl OthelloEnv {
    pub fn new(config: EnvConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let state = GameState::new();

        Self {
            before_board: state.board().get_board(),
            state,
            config,
            rng,
            terminated: false,
        }
    }

    /// Environment over an existing position, e.g. for replaying a scenario
    pub fn from_state(state: GameState, config: EnvConfig) -> Self {
        let mut env = Self::new(config);
        env.before_board = state.board().get_board();
        env.terminated = state.is_game_over();
        env.state = state;
        env
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        self.state.board()
    }

    /// Snapshot of the grid for renderers
    pub fn get_board(&self) -> Grid<Cell> {
        self.state.board().get_board()
    }

    pub fn current_player(&self) -> Player {
        self.state.current_player()
    }

    pub fn count(&self, player: Player) -> usize {
        self.state.board().count(player)
    }

    /// Legal moves for the player to move
    pub fn valid_moves(&self) -> Vec<Move> {
        self.state.valid_moves()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn observation(&self) -> Observation {
        Observation::from_state(&self.state)
    }

    pub fn info(&self) -> StepInfo {
        let board = self.state.board();
        StepInfo {
            agent: self.state.current_player(),
            white_count: board.count(Player::White),
            black_count: board.count(Player::Black),
            board: board.get_board(),
            before_board: self.before_board,
        }
    }

    /// Start a new episode.
    ///
    /// A `seed` reseeds the environment RNG; without one the RNG carries on.
    /// With no explicit offset and a configured `random_offset`, the number of
    /// pre-played plies is drawn from `[0, random_offset)`. Pre-play stops
    /// early if it reaches the end of the game.
    pub fn reset(&mut self, seed: Option<u64>, options: ResetOptions) -> (Observation, StepInfo) {
        debug!(?seed, ?options, "reset");
        if let Some(seed) = seed {
            self.rng = ChaCha20Rng::seed_from_u64(seed);
        }

        self.state.reset();
        self.terminated = false;
        self.before_board = self.state.board().get_board();

        let offset = match options.offset {
            Some(offset) => offset,
            None if self.config.random_offset > 0 => self.rng.gen_range(0..self.config.random_offset),
            None => 0,
        };

        for ply in 0..offset {
            let Some(action) = self.sample_legal_action() else {
                break;
            };
            let actor = self.current_player();
            if let Err(error) = self.apply_move(actor, action) {
                warn!(%error, ply, "pre-play move rejected");
                break;
            }
            if self.terminated {
                debug!(ply, "pre-play reached the end of the game");
                break;
            }
        }

        (self.observation(), self.info())
    }

    /// Gym-style step: `actions` maps agents to flat move indices.
    ///
    /// Only the entry for the agent to move is used. A missing entry is an
    /// invalid-actor violation charged to the agent that did submit (or to
    /// the agent to move when the map is empty).
    pub fn step(&mut self, actions: &HashMap<Player, i64>) -> StepResult {
        let to_move = self.current_player();
        debug!(?actions, legal = ?self.state.valid_moves(), "step");

        let outcome = match actions.get(&to_move) {
            Some(&index) => self.apply_move(to_move, index),
            None => {
                let actor = actions.keys().copied().find(|&p| p != to_move);
                self.guarded(|_| {
                    Err(GameError::InvalidActor {
                        expected: to_move,
                        actor,
                    })
                })
            }
        };

        match outcome {
            Ok(result) => result,
            Err(error) => self.penalize(error),
        }
    }

    /// Validate and play one move for `actor`.
    ///
    /// Every error ends the episode; [`OthelloEnv::step`] turns it into a
    /// penalty.
    pub fn apply_move(&mut self, actor: Player, index: i64) -> Result<StepResult, GameError> {
        self.guarded(|env| env.play(actor, index))
    }

    /// Uniformly random legal move for the agent to move
    pub fn sample_legal_action(&mut self) -> Option<i64> {
        let mask = self.state.board().action_mask(self.state.current_player());
        self.sample_masked_action(&mask)
    }

    /// Random cell from an externally supplied mask, drawn from the env RNG
    pub fn sample_masked_action(&mut self, mask: &Grid<u8>) -> Option<i64> {
        sample_action(mask, &mut self.rng)
    }

    fn guarded<F>(&mut self, f: F) -> Result<StepResult, GameError>
    where
        F: FnOnce(&mut Self) -> Result<StepResult, GameError>,
    {
        if self.terminated {
            return Err(GameError::EpisodeOver);
        }

        self.before_board = self.state.board().get_board();
        let outcome = f(self);
        if outcome.is_err() {
            self.terminated = true;
        }
        outcome
    }

    fn play(&mut self, actor: Player, index: i64) -> Result<StepResult, GameError> {
        let expected = self.state.current_player();
        if actor != expected {
            return Err(GameError::InvalidActor {
                expected,
                actor: Some(actor),
            });
        }

        let mv = Move::from_index(index)?;
        let ply = self.state.play(mv)?;
        debug!(
            player = %actor,
            col = mv.col(),
            row = mv.row(),
            flipped = ply.flipped.len(),
            advance = ?ply.advance,
            "placed"
        );

        let mut rewards = Rewards::default();
        if mv.is_corner() {
            rewards.set(actor, self.config.corner_bonus);
            rewards.set(actor.opponent(), -self.config.corner_bonus);
        }

        if self.state.is_game_over() {
            let white = self.count(Player::White);
            let black = self.count(Player::Black);
            rewards = Rewards {
                white: terminal_reward(white, black),
                black: terminal_reward(black, white),
            };
            self.terminated = true;
            debug!(white, black, ?rewards, "game over");
        }

        Ok(self.result(rewards, None))
    }

    fn penalize(&mut self, error: GameError) -> StepResult {
        let mut rewards = Rewards::default();

        if error == GameError::EpisodeOver {
            warn!("step called after the episode ended");
        } else {
            info!(%error, "invalid action");
            let offender = error.offender().unwrap_or(self.state.current_player());
            rewards.set(offender, -self.config.invalid_action_penalty);
        }

        self.result(rewards, Some(error))
    }

    fn result(&self, rewards: Rewards, error: Option<GameError>) -> StepResult {
        StepResult {
            observation: self.observation(),
            rewards,
            terminated: self.terminated,
            truncated: false,
            info: self.info(),
            error,
        }
    }
}

impl Default for OthelloEnv {
    fn default() -> Self {
        Self::new(EnvConfig::default())
    }
}
