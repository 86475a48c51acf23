use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Position ({row}, {col}) is out of bounds for grid size ({rows}, {columns})")]
    OutOfBounds {
        row: i32,
        col: i32,
        rows: usize,
        columns: usize,
    },
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Cells are addressed by [`Position`]; positions with a negative or too large
/// coordinate are simply outside the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    columns: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled by a generator function.
    ///
    /// The generator function `f` is called once per cell in row-major order
    /// with that cell's position.
    ///
    /// # Panics
    ///
    /// Panics if `rows * columns` overflows `usize`.
    pub fn from_generator<F>(rows: usize, columns: usize, mut f: F) -> Self
    where
        F: FnMut(Position) -> T,
    {
        let size = rows.checked_mul(columns).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for row in 0..rows {
            for col in 0..columns {
                cells.push(f(Position::new(row as i32, col as i32)));
            }
        }
        Grid {
            rows,
            columns,
            cells,
        }
    }

    /// Returns the number of rows in the grid.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns in the grid.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Converts a position to a flat vector index.
    ///
    /// Returns `None` if the position is out of bounds.
    #[inline]
    fn position_to_index(&self, position: Position) -> Option<usize> {
        let row = usize::try_from(position.row).ok()?;
        let col = usize::try_from(position.col).ok()?;
        if row < self.rows && col < self.columns {
            Some(row * self.columns + col)
        } else {
            None
        }
    }

    /// Checks if the given position lies within the grid boundaries.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        self.position_to_index(position).is_some()
    }

    /// Gets an immutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        let index = self.position_to_index(position)?;
        self.cells.get(index)
    }

    /// Sets the value of the cell at the given position.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let index = self
            .position_to_index(position)
            .ok_or(GridError::OutOfBounds {
                row: position.row,
                col: position.col,
                rows: self.rows,
                columns: self.columns,
            })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let columns = self.columns;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let row = index / columns;
            let col = index % columns;
            (Position::new(row as i32, col as i32), cell)
        })
    }
}

/// Indexing using Position coordinates for access
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        match self.position_to_index(index) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                index.row, index.col, self.rows, self.columns
            ),
        }
    }
}
