//! Environment configuration.
//!
//! Defaults are the standard reward magnitudes. Values can be read from
//! TOML and then overridden from `GYM_OTHELLO_*` environment variables.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::GameError;

const DEFAULT_INVALID_ACTION_PENALTY: f32 = 10.0;
const DEFAULT_CORNER_BONUS: f32 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Upper bound (exclusive) for the random number of pre-played plies on
    /// reset when no explicit offset is given. 0 disables it.
    pub random_offset: u32,
    /// Seed for the environment RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Magnitude of the penalty for a wrong actor or an illegal move
    pub invalid_action_penalty: f32,
    /// Reward for taking a corner, mirrored as a penalty for the opponent
    pub corner_bonus: f32,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            random_offset: 0,
            seed: None,
            invalid_action_penalty: DEFAULT_INVALID_ACTION_PENALTY,
            corner_bonus: DEFAULT_CORNER_BONUS,
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // Parseable field
    ($config:expr, $field:ident, $key:expr) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => {
                    debug!("{} overrides {}", $key, stringify!($field));
                    $config.$field = v;
                }
                Err(_) => warn!("Ignoring {}={:?}: not a valid value", $key, raw),
            }
        }
    };
    // Optional parseable field
    ($config:expr, $field:ident, $key:expr, optional) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => {
                    debug!("{} overrides {}", $key, stringify!($field));
                    $config.$field = Some(v);
                }
                Err(_) => warn!("Ignoring {}={:?}: not a valid value", $key, raw),
            }
        }
    };
}

impl EnvConfig {
    pub fn with_random_offset(mut self, random_offset: u32) -> Self {
        self.random_offset = random_offset;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, GameError> {
        let config: EnvConfig =
            toml::from_str(content).map_err(|e| GameError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GYM_OTHELLO_<FIELD>` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        env_override!(self, random_offset, "GYM_OTHELLO_RANDOM_OFFSET");
        env_override!(self, seed, "GYM_OTHELLO_SEED", optional);
        env_override!(
            self,
            invalid_action_penalty,
            "GYM_OTHELLO_INVALID_ACTION_PENALTY"
        );
        env_override!(self, corner_bonus, "GYM_OTHELLO_CORNER_BONUS");
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !self.invalid_action_penalty.is_finite() || self.invalid_action_penalty < 0.0 {
            return Err(GameError::Config(format!(
                "invalid_action_penalty must be a non-negative number, got {}",
                self.invalid_action_penalty
            )));
        }
        if !self.corner_bonus.is_finite() {
            return Err(GameError::Config(format!(
                "corner_bonus must be finite, got {}",
                self.corner_bonus
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reward_magnitudes() {
        let config = EnvConfig::default();

        assert_eq!(config.random_offset, 0);
        assert_eq!(config.seed, None);
        assert_eq!(config.invalid_action_penalty, 10.0);
        assert_eq!(config.corner_bonus, 0.25);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EnvConfig::from_toml_str("random_offset = 12\nseed = 7\n").unwrap();

        assert_eq!(config.random_offset, 12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.invalid_action_penalty, 10.0);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EnvConfig::from_toml_str("random_offset = \"many\"").unwrap_err();
        assert!(matches!(err, GameError::Config(_)));

        let err = EnvConfig::from_toml_str("invalid_action_penalty = -1.0").unwrap_err();
        assert!(err.to_string().contains("invalid_action_penalty"));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("GYM_OTHELLO_RANDOM_OFFSET", "20");
        std::env::set_var("GYM_OTHELLO_SEED", "not-a-number");

        let config = EnvConfig::default().with_env_overrides();

        std::env::remove_var("GYM_OTHELLO_RANDOM_OFFSET");
        std::env::remove_var("GYM_OTHELLO_SEED");

        assert_eq!(config.random_offset, 20);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_builders() {
        let config = EnvConfig::default().with_random_offset(5).with_seed(3);
        assert_eq!(config.random_offset, 5);
        assert_eq!(config.seed, Some(3));
    }
}
