use crate::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named board presets, ordered from easiest to hardest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Expert];

    pub fn config(self) -> GameConfig {
        let (rows, cols, mines) = match self {
            Level::Beginner => (9, 9, 10),
            Level::Intermediate => (16, 16, 40),
            Level::Expert => (16, 30, 99),
        };
        GameConfig {
            rows,
            cols,
            mines,
            level: Some(self),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Expert => "expert",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&l| l == self).unwrap_or(0)
    }

    /// The next harder level, staying put at the hardest one.
    pub fn next(self) -> Level {
        Self::ALL[(self.index() + 1).min(Self::ALL.len() - 1)]
    }

    /// The next easier level, staying put at the easiest one.
    pub fn prev(self) -> Level {
        Self::ALL[self.index().saturating_sub(1)]
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GameError::UnknownLevel(s.to_string()))
    }
}

/// Board dimensions and mine count for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: u32,
    pub cols: u32,
    pub mines: u32,
    /// `None` for custom boards.
    pub level: Option<Level>,
}

impl GameConfig {
    /// Validates a custom board. There must be at least one safe cell.
    pub fn custom(rows: u32, cols: u32, mines: u32) -> Result<Self> {
        let config = Self {
            rows,
            cols,
            mines,
            level: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let &Self {
            rows, cols, mines, ..
        } = self;
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        let cells = rows
            .checked_mul(cols)
            .ok_or(GameError::InvalidDimensions { rows, cols })?;
        if mines >= cells {
            return Err(GameError::TooManyMines { rows, cols, mines });
        }
        if mines.saturating_add(9) > cells {
            log::warn!(
                "{} mines on a {}x{} board leaves no room for a fully safe opening",
                mines,
                rows,
                cols
            );
        }
        Ok(())
    }

    /// Level name used when reporting scores.
    pub fn level_name(&self) -> &'static str {
        self.level.map_or("custom", Level::name)
    }
}
