use crate::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative offsets of the eight surrounding cells, row-major.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// All eight surrounding positions, including ones off the board.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        NEIGHBOR_OFFSETS
            .into_iter()
            .map(move |(dr, dc)| Position::new(self.row + dr, self.col + dc))
    }

    /// Stable identifier used by the presentation layer, e.g. `c-3-7`.
    pub fn cell_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c-{}-{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidCellId(s.to_string());

        let rest = s.strip_prefix("c-").ok_or_else(invalid)?;
        let (row, col) = rest.split_once('-').ok_or_else(invalid)?;
        let row = row.parse().map_err(|_| invalid())?;
        let col = col.parse().map_err(|_| invalid())?;

        Ok(Position::new(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_are_row_major() {
        let neighbors: Vec<(i32, i32)> = Position::new(1, 1)
            .neighbors()
            .map(|pos| (pos.row, pos.col))
            .collect();

        assert_eq!(
            neighbors,
            [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn test_neighbors_include_off_board_positions() {
        let neighbors: Vec<Position> = Position::new(0, 0).neighbors().collect();
        assert_eq!(neighbors.first(), Some(&Position::new(-1, -1)));
        assert_eq!(neighbors.last(), Some(&Position::new(1, 1)));
    }

    #[test]
    fn test_cell_id_format() {
        assert_eq!(Position::new(3, 12).cell_id(), "c-3-12");
        assert_eq!("c-3-12".parse::<Position>().unwrap(), Position::new(3, 12));
    }

    #[test]
    fn test_cell_id_rejects_garbage() {
        for id in ["", "c-", "c-1", "x-1-2", "c-a-2", "c-1-2-3"] {
            assert_eq!(
                id.parse::<Position>(),
                Err(GameError::InvalidCellId(id.to_string())),
                "{id} should not parse"
            );
        }
    }
}
