use serde::{Deserialize, Serialize};

/// Errors raised when a [`RoundConfig`] cannot produce a playable round.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Field must have at least one row and one column, got ({rows}, {columns})")]
    EmptyField { rows: usize, columns: usize },
    #[error("Field size ({rows}, {columns}) does not fit signed coordinates")]
    FieldTooLarge { rows: usize, columns: usize },
    #[error("Wall chance must be a percentage in 0..=100, got {0}")]
    WallChance(u32),
    #[error("Move budget must be at least one move")]
    NoMoves,
    #[error("At least one exit is required")]
    NoExits,
}

/// The fixed constants a round is played with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub rows: usize,
    pub columns: usize,
    /// Percentage chance for an ordinary cell to become a wall.
    pub wall_chance: u32,
    pub max_moves: u32,
    pub exits: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig {
            rows: 10,
            columns: 15,
            wall_chance: 25,
            max_moves: 40,
            exits: 3,
        }
    }
}

impl RoundConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::EmptyField {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if i32::try_from(self.rows).is_err() || i32::try_from(self.columns).is_err() {
            return Err(ConfigError::FieldTooLarge {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.wall_chance > 100 {
            return Err(ConfigError::WallChance(self.wall_chance));
        }
        if self.max_moves == 0 {
            return Err(ConfigError::NoMoves);
        }
        if self.exits == 0 {
            return Err(ConfigError::NoExits);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RoundConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!((config.rows, config.columns), (10, 15));
        assert_eq!(config.max_moves, 40);
    }

    #[test]
    fn rejects_unplayable_settings() {
        let base = RoundConfig::default();
        let cases = [
            (
                RoundConfig { rows: 0, ..base.clone() },
                ConfigError::EmptyField { rows: 0, columns: 15 },
            ),
            (
                RoundConfig { wall_chance: 101, ..base.clone() },
                ConfigError::WallChance(101),
            ),
            (
                RoundConfig { max_moves: 0, ..base.clone() },
                ConfigError::NoMoves,
            ),
            (
                RoundConfig { exits: 0, ..base.clone() },
                ConfigError::NoExits,
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }
}
