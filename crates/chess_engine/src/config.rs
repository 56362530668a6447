//! Difficulty policy.
//!
//! Every knob that differs between difficulty levels lives in one table,
//! [`EngineConfig`], which can be loaded from TOML:
//!
//! ```toml
//! draw_scale = 1000
//!
//! [easy]
//! depth = 2
//! think_delay_ms = 500
//! book_probability = 1.0
//! random_move_probability = 0.3
//! draw_adjustment = 0.2
//! ```

use std::{fmt, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(EngineError::Config(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// Search and randomisation settings for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Plies searched from the root.
    pub depth: u8,
    /// Minimum wall time before a move is handed back. Pacing only.
    pub think_delay_ms: u64,
    /// Chance of playing a legal book move when one exists.
    pub book_probability: f64,
    /// Chance of replacing the searched move by a random legal one.
    pub random_move_probability: f64,
    /// Added to the draw acceptance probability (negative = stricter).
    pub draw_adjustment: f64,
}

impl DifficultyProfile {
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Evaluation magnitude (centipawns) at which draw offers are never accepted.
    pub draw_scale: f64,
    pub easy: DifficultyProfile,
    pub medium: DifficultyProfile,
    pub hard: DifficultyProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            draw_scale: 1000.0,
            easy: DifficultyProfile {
                depth: 2,
                think_delay_ms: 500,
                book_probability: 1.0,
                random_move_probability: 0.3,
                draw_adjustment: 0.2,
            },
            medium: DifficultyProfile {
                depth: 3,
                think_delay_ms: 1000,
                book_probability: 0.8,
                random_move_probability: 0.0,
                draw_adjustment: 0.0,
            },
            hard: DifficultyProfile {
                depth: 4,
                think_delay_ms: 2000,
                book_probability: 0.8,
                random_move_probability: 0.0,
                draw_adjustment: -0.2,
            },
        }
    }
}

impl EngineConfig {
    pub fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Same policy with every pacing delay removed.
    pub fn without_delays(mut self) -> Self {
        for profile in [&mut self.easy, &mut self.medium, &mut self.hard] {
            profile.think_delay_ms = 0;
        }
        self
    }

    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.draw_scale.is_finite() && self.draw_scale > 0.0) {
            return Err(EngineError::Config(format!(
                "draw_scale must be positive, got {}",
                self.draw_scale
            )));
        }

        for difficulty in Difficulty::ALL {
            let profile = self.profile(difficulty);
            if profile.depth == 0 {
                return Err(EngineError::Config(format!("{}: depth must be at least 1", difficulty)));
            }
            for (name, value) in [
                ("book_probability", profile.book_probability),
                ("random_move_probability", profile.random_move_probability),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(EngineError::Config(format!(
                        "{}: {} must be within [0, 1], got {}",
                        difficulty, name, value
                    )));
                }
            }
            if !(-1.0..=1.0).contains(&profile.draw_adjustment) {
                return Err(EngineError::Config(format!(
                    "{}: draw_adjustment must be within [-1, 1], got {}",
                    difficulty, profile.draw_adjustment
                )));
            }
        }
        Ok(())
    }
}
