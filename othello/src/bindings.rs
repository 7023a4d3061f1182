/// PyO3 bindings for the Othello environment
/// Exposes the Rust episode surface to Python with gym-style dictionaries
use std::collections::HashMap;

use ndarray::{Array2, Array3};
use numpy::{PyArray2, PyArray3, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::board::BOARD_SIZE;
use crate::env::{actions_from_ids, Grid, Observation, OthelloEnv, ResetOptions, StepInfo};
use crate::{Cell, EnvConfig, GameError, Player};

impl From<GameError> for PyErr {
    fn from(err: GameError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

type StepTuple = (
    PyObject,
    HashMap<&'static str, f32>,
    HashMap<&'static str, bool>,
    HashMap<&'static str, bool>,
    PyObject,
);

/// Python wrapper for the two-agent Othello environment
///
/// Agents are "white" and "black"; white moves first. Actions are flat cell
/// indices (row * 8 + col).
#[pyclass(name = "OthelloEnv")]
pub struct PyOthelloEnv {
    env: OthelloEnv,
}

#[pymethods]
impl PyOthelloEnv {
    /// Create an environment
    ///
    /// Args:
    ///     random_offset (int, optional): pre-play a random number of plies in
    ///         [0, random_offset) on reset when no explicit offset is given
    ///     seed (int, optional): seed for the environment RNG
    ///
    /// Unset arguments fall back to GYM_OTHELLO_* environment variables.
    #[new]
    #[pyo3(signature = (random_offset=None, seed=None))]
    pub fn new(random_offset: Option<u32>, seed: Option<u64>) -> PyResult<Self> {
        let mut config = EnvConfig::default().with_env_overrides();
        if let Some(random_offset) = random_offset {
            config = config.with_random_offset(random_offset);
        }
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }
        config.validate()?;

        Ok(Self {
            env: OthelloEnv::new(config),
        })
    }

    #[getter]
    pub fn agents(&self) -> Vec<&'static str> {
        Player::ALL.iter().map(Player::agent_id).collect()
    }

    #[getter]
    pub fn possible_agents(&self) -> Vec<&'static str> {
        self.agents()
    }

    #[getter]
    pub fn num_agents(&self) -> usize {
        Player::ALL.len()
    }

    #[getter]
    pub fn max_num_agents(&self) -> usize {
        Player::ALL.len()
    }

    /// Agent id of the player to move
    #[getter]
    pub fn current_player(&self) -> &'static str {
        self.env.current_player().agent_id()
    }

    /// Start a new episode
    ///
    /// Args:
    ///     seed (int, optional): reseed the environment RNG
    ///     options (dict, optional): {"offset": int} plies of random play
    ///
    /// Returns:
    ///     tuple: (observations, infos), both keyed by the agent to move
    #[pyo3(signature = (seed=None, options=None))]
    pub fn reset(
        &mut self,
        py: Python<'_>,
        seed: Option<u64>,
        options: Option<&PyDict>,
    ) -> PyResult<(PyObject, PyObject)> {
        let offset = match options {
            Some(options) => match options.get_item("offset")? {
                Some(value) => Some(value.extract::<u32>()?),
                None => None,
            },
            None => None,
        };

        let (obs, info) = self.env.reset(seed, ResetOptions { offset });

        Ok((
            observation_dict(py, &obs)?.into(),
            info_dict(py, &info, None)?.into(),
        ))
    }

    /// Play one ply
    ///
    /// Args:
    ///     action (dict): {agent_id: flat index} for the agent to move
    ///
    /// Returns:
    ///     tuple: (observations, rewards, terminateds, truncateds, infos)
    ///         - terminateds["__all__"] is True once the episode is over
    ///         - a wrong agent or an illegal move ends the episode with a
    ///           penalty for the offending agent
    ///         - keys other than "white" and "black" are ignored, so a dict
    ///           without the agent to move ends the episode with a penalty
    ///           for that agent
    ///         - an index outside 0..64, negative included, is an illegal move
    pub fn step(&mut self, py: Python<'_>, action: HashMap<String, i64>) -> PyResult<StepTuple> {
        let result = self.env.step(&actions_from_ids(action));

        let rewards = Player::ALL
            .iter()
            .map(|&player| (player.agent_id(), result.rewards[player]))
            .collect();
        let terminateds = HashMap::from([("__all__", result.terminated)]);
        let truncateds = HashMap::new();
        let error = result.error.as_ref().map(GameError::to_string);

        Ok((
            observation_dict(py, &result.observation)?.into(),
            rewards,
            terminateds,
            truncateds,
            info_dict(py, &result.info, error)?.into(),
        ))
    }

    /// Get the current board as a 2D numpy array
    ///
    /// Returns:
    ///     np.ndarray: Shape (8, 8) with dtype uint8
    ///         - 0 = Empty cell
    ///         - 1 = White piece
    ///         - 2 = Black piece
    pub fn get_board<'py>(&self, py: Python<'py>) -> &'py PyArray2<u8> {
        let state = self.env.board().to_state();
        let array = Array2::from_shape_fn((BOARD_SIZE, BOARD_SIZE), |(row, col)| {
            state[row * BOARD_SIZE + col]
        });
        PyArray2::from_owned_array(py, array)
    }

    /// Number of pieces owned by `agent` ("white" or "black")
    pub fn count(&self, agent: &str) -> PyResult<usize> {
        Ok(self.env.count(agent.parse()?))
    }

    /// Legal moves for the player to move as (col, row) pairs, row-major
    pub fn valid_moves(&self) -> Vec<(usize, usize)> {
        self.env
            .valid_moves()
            .into_iter()
            .map(|mv| (mv.col(), mv.row()))
            .collect()
    }

    pub fn is_game_over(&self) -> bool {
        self.env.is_game_over()
    }

    /// Sample a flat index uniformly from the non-zero cells of an action
    /// mask, using the environment RNG
    ///
    /// Args:
    ///     obs: an agent's observation dict (its "action_mask" is used) or
    ///         an (8, 8) mask array
    ///
    /// Returns:
    ///     int or None: None when the mask is empty
    ///
    /// Raises:
    ///     ValueError: If a dict has no "action_mask" or the mask is not (8, 8)
    pub fn random_agent(&mut self, obs: &PyAny) -> PyResult<Option<i64>> {
        let mask = match obs.downcast::<PyDict>() {
            Ok(dict) => dict
                .get_item("action_mask")?
                .ok_or_else(|| PyValueError::new_err("observation has no \"action_mask\""))?,
            Err(_) => obs,
        };
        let action_mask: PyReadonlyArray2<i8> = mask.extract()?;
        let view = action_mask.as_array();
        if view.shape() != [BOARD_SIZE, BOARD_SIZE] {
            return Err(PyValueError::new_err(format!(
                "action_mask must have shape (8, 8), got {:?}",
                view.shape()
            )));
        }

        let mut mask: Grid<u8> = [[0; BOARD_SIZE]; BOARD_SIZE];
        for ((row, col), &value) in view.indexed_iter() {
            mask[row][col] = u8::from(value != 0);
        }

        Ok(self.env.sample_masked_action(&mask))
    }
}

fn observation_dict<'py>(py: Python<'py>, obs: &Observation) -> PyResult<&'py PyDict> {
    let planes = Array3::from_shape_fn((2, BOARD_SIZE, BOARD_SIZE), |(plane, row, col)| {
        obs.planes[plane][row][col] as i8
    });
    let mask = Array2::from_shape_fn((BOARD_SIZE, BOARD_SIZE), |(row, col)| {
        obs.action_mask[row][col] as i8
    });

    let entry = PyDict::new(py);
    entry.set_item("observation", PyArray3::from_owned_array(py, planes))?;
    entry.set_item("action_mask", PyArray2::from_owned_array(py, mask))?;

    let dict = PyDict::new(py);
    dict.set_item(obs.agent.agent_id(), entry)?;
    Ok(dict)
}

fn info_dict<'py>(py: Python<'py>, info: &StepInfo, error: Option<String>) -> PyResult<&'py PyDict> {
    let entry = PyDict::new(py);
    entry.set_item("white_count", info.white_count)?;
    entry.set_item("black_count", info.black_count)?;
    entry.set_item("board", grid_codes(&info.board))?;
    entry.set_item("before_board", grid_codes(&info.before_board))?;
    if let Some(error) = error {
        entry.set_item("error", error)?;
    }

    let dict = PyDict::new(py);
    dict.set_item(info.agent.agent_id(), entry)?;
    Ok(dict)
}

fn grid_codes(grid: &Grid<Cell>) -> Vec<Vec<u8>> {
    grid.iter()
        .map(|row| row.iter().map(Cell::code).collect())
        .collect()
}

/// Python module definition
///
/// This module can be imported in Python as `gym_othello`
#[pymodule]
fn gym_othello(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyOthelloEnv>()?;
    m.add("PLAYER_WHITE", Cell::White.code())?;
    m.add("PLAYER_BLACK", Cell::Black.code())?;
    Ok(())
}
