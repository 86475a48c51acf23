use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Position, config::RoundConfig, map::Grid};

/// Represents the static type of a cell in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Wall,
}

/// The generated labyrinth. Player, key and exits are not stored in it.
pub type Field = Grid<Cell>;

/// Positions of the special objects of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub player: Position,
    pub key: Position,
    pub exits: Vec<Position>,
}

impl Layout {
    pub fn is_exit(&self, position: Position) -> bool {
        self.exits.contains(&position)
    }

    /// Special cells are never walls.
    pub fn is_special(&self, position: Position) -> bool {
        self.player == position || self.key == position || self.is_exit(position)
    }
}

/// Errors produced when parsing a textual field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldParseError {
    #[error("Field string is empty")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown cell symbol '{symbol}' at ({row}, {col})")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
}

fn random_position<R: Rng + ?Sized>(config: &RoundConfig, rng: &mut R) -> Position {
    Position::new(
        rng.random_range(0..config.rows) as i32,
        rng.random_range(0..config.columns) as i32,
    )
}

/// Draws the player, the key and every exit uniformly over the whole field.
///
/// Draws are independent; two special objects may share a cell.
pub fn generate_layout<R: Rng + ?Sized>(config: &RoundConfig, rng: &mut R) -> Layout {
    let player = random_position(config, rng);
    let key = random_position(config, rng);
    let exits = (0..config.exits)
        .map(|_| random_position(config, rng))
        .collect();
    Layout { player, key, exits }
}

/// Rolls every cell independently against `wall_chance`, keeping special cells empty.
pub fn generate_field<R: Rng + ?Sized>(config: &RoundConfig, layout: &Layout, rng: &mut R) -> Field {
    let field = Grid::from_generator(config.rows, config.columns, |position| {
        // Roll even for special cells so the random stream does not depend on the layout.
        let roll: u32 = rng.random_range(0..100);
        if layout.is_special(position) {
            Cell::Empty
        } else if roll < config.wall_chance {
            Cell::Wall
        } else {
            Cell::Empty
        }
    });
    debug!(
        walls = field.enumerate().filter(|(_, c)| **c == Cell::Wall).count(),
        rows = config.rows,
        columns = config.columns,
        "generated field"
    );
    field
}

/// Checks whether `candidate` is inside the field and not a wall.
pub fn try_move(field: &Field, candidate: Position) -> bool {
    matches!(field.get(candidate), Some(Cell::Empty))
}

/// Parses a field from rows of `#` (wall) and `.` (empty).
pub fn parse_field(text: &str) -> Result<Field, FieldParseError> {
    let lines: Vec<Vec<char>> = text
        .trim()
        .lines()
        .map(|line| line.trim().chars().collect())
        .collect();
    let width = match lines.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(FieldParseError::Empty),
    };

    let mut cells = Vec::with_capacity(lines.len() * width);
    for (row, line) in lines.iter().enumerate() {
        if line.len() != width {
            return Err(FieldParseError::RaggedRow {
                row,
                expected: width,
                found: line.len(),
            });
        }
        for (col, symbol) in line.iter().enumerate() {
            let cell = match symbol {
                '#' => Cell::Wall,
                '.' => Cell::Empty,
                other => {
                    return Err(FieldParseError::UnknownSymbol {
                        symbol: *other,
                        row,
                        col,
                    });
                }
            };
            cells.push(cell);
        }
    }

    let mut cells = cells.into_iter();
    Ok(Grid::from_generator(lines.len(), width, |_| {
        cells.next().unwrap_or_default()
    }))
}
