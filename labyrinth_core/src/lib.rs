use std::ops::Add;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod field;
pub mod map;
pub mod round;

/// Represents a cell coordinate as (row, column).
///
/// Coordinates are signed so that a step off the edge of the field is still a
/// representable candidate that the movement validator can reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }
}

/// A single movement intent supplied by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Returns the `(row, column)` delta this direction applies.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::None => (0, 0),
        }
    }
}

impl Add<Direction> for Position {
    type Output = Position;

    fn add(self, direction: Direction) -> Self::Output {
        let (d_row, d_col) = direction.offset();
        Position {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_direction_shifts_the_position() {
        let start = Position::new(2, 2);
        assert_eq!(start + Direction::Up, Position::new(1, 2));
        assert_eq!(start + Direction::Down, Position::new(3, 2));
        assert_eq!(start + Direction::Left, Position::new(2, 1));
        assert_eq!(start + Direction::Right, Position::new(2, 3));
        assert_eq!(start + Direction::None, start);
    }

    #[test]
    fn stepping_off_the_origin_goes_negative() {
        let origin = Position::new(0, 0);
        assert_eq!(origin + Direction::Up, Position::new(-1, 0));
        assert_eq!(origin + Direction::Left, Position::new(0, -1));
    }
}
