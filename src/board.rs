use crate::{GameError, Position, Result};
use ndarray::Array2;
use std::collections::HashMap;

/// State of a single grid position.
///
/// `value` is the number of neighboring mines and is `None` exactly when the
/// cell itself holds a mine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub position: Position,
    pub value: Option<u8>,
    pub is_mine: bool,
    pub is_flagged: bool,
    pub is_revealed: bool,
}

impl Cell {
    fn new(position: Position) -> Self {
        Self {
            position,
            value: Some(0),
            is_mine: false,
            is_flagged: false,
            is_revealed: false,
        }
    }

    pub fn is_hidden(&self) -> bool {
        !self.is_revealed && !self.is_flagged
    }
}

/// What a player is allowed to see of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellView {
    #[default]
    Hidden,
    Flagged,
    Revealed(u8),
    Mine,
}

#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) cells: HashMap<Position, Cell>,
    rows: u32,
    cols: u32,
}

impl Board {
    /// Creates a mine-free board with every position present.
    pub fn new(rows: u32, cols: u32) -> Result<Self> {
        let too_large = rows.checked_mul(cols).map_or(true, |n| n > i32::MAX as u32);
        if rows == 0 || cols == 0 || too_large {
            return Err(GameError::InvalidDimensions { rows, cols });
        }

        let mut board = Board {
            cells: HashMap::with_capacity((rows * cols) as usize),
            rows,
            cols,
        };
        board.initialize_cells();
        Ok(board)
    }

    /// Builds a board with mines at exactly the given positions.
    pub fn with_mines(rows: u32, cols: u32, mines: &[Position]) -> Result<Self> {
        let mut board = Board::new(rows, cols)?;

        for &pos in mines {
            board.cell_mut(pos)?.is_mine = true;
        }

        let mine_count = board.mine_count();
        if mine_count >= board.total_cells() {
            return Err(GameError::TooManyMines {
                rows,
                cols,
                mines: mine_count,
            });
        }

        board.recompute_all();
        Ok(board)
    }

    fn initialize_cells(&mut self) {
        for pos in self.iter_positions() {
            self.cells.insert(pos, Cell::new(pos));
        }
    }

    pub fn is_within_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.rows as i32 && pos.col >= 0 && pos.col < self.cols as i32
    }

    pub fn get_cell(&self, pos: Position) -> Result<&Cell> {
        self.cells.get(&pos).ok_or(GameError::OutOfBounds(pos))
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> Result<&mut Cell> {
        self.cells.get_mut(&pos).ok_or(GameError::OutOfBounds(pos))
    }

    /// Looks a cell up by its presentation id (`c-{row}-{col}`).
    pub fn get_cell_by_id(&self, id: &str) -> Result<&Cell> {
        self.get_cell(id.parse()?)
    }

    /// On-board neighbors of `pos`. Edge and corner cells have fewer than eight.
    pub fn neighbors_of(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        pos.neighbors().filter(move |p| self.is_within_bounds(*p))
    }

    pub fn neighbor_cells(&self, pos: Position) -> impl Iterator<Item = &Cell> + '_ {
        self.neighbors_of(pos).filter_map(move |p| self.cells.get(&p))
    }

    pub fn count_adjacent_mines(&self, pos: Position) -> u8 {
        self.neighbor_cells(pos).filter(|cell| cell.is_mine).count() as u8
    }

    pub fn count_adjacent_flags(&self, pos: Position) -> u8 {
        self.neighbor_cells(pos)
            .filter(|cell| cell.is_flagged)
            .count() as u8
    }

    /// Recomputes `value` for the given cells. Mines are left at `None`.
    pub fn recompute_values<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Position>,
    {
        for pos in positions {
            let value = match self.cells.get(&pos) {
                Some(cell) if cell.is_mine => None,
                Some(_) => Some(self.count_adjacent_mines(pos)),
                None => continue,
            };
            if let Some(cell) = self.cells.get_mut(&pos) {
                cell.value = value;
            }
        }
    }

    pub(crate) fn recompute_all(&mut self) {
        let positions: Vec<_> = self.iter_positions().collect();
        self.recompute_values(positions);
    }

    /// Positions in row-major order.
    pub fn iter_positions(&self) -> BoardIterator {
        BoardIterator::new(self.rows, self.cols)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.iter_positions()
            .filter_map(move |pos| self.cells.get(&pos))
    }

    pub fn mine_positions(&self) -> Vec<Position> {
        self.cells()
            .filter(|cell| cell.is_mine)
            .map(|cell| cell.position)
            .collect()
    }

    pub fn mine_count(&self) -> u32 {
        self.cells.values().filter(|cell| cell.is_mine).count() as u32
    }

    pub fn total_cells(&self) -> u32 {
        self.rows * self.cols
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    /// Player-visible snapshot indexed by `[row, col]`. With `show_mines`,
    /// unrevealed mines are shown as well, as after a loss.
    pub fn view(&self, show_mines: bool) -> Array2<CellView> {
        let mut grid = Array2::default((self.rows as usize, self.cols as usize));

        for cell in self.cells() {
            let view = match cell {
                Cell { is_revealed: true, is_mine: true, .. } => CellView::Mine,
                Cell { is_revealed: true, value, .. } => CellView::Revealed(value.unwrap_or(0)),
                Cell { is_mine: true, .. } if show_mines => CellView::Mine,
                Cell { is_flagged: true, .. } => CellView::Flagged,
                _ => CellView::Hidden,
            };
            grid[[cell.position.row as usize, cell.position.col as usize]] = view;
        }

        grid
    }
}

/// Row-major walk over every position of a board.
#[derive(Debug, Clone)]
pub struct BoardIterator {
    rows: u32,
    cols: u32,
    next: u32,
}

impl BoardIterator {
    fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols, next: 0 }
    }
}

impl Iterator for BoardIterator {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.rows * self.cols {
            return None;
        }
        let pos = Position::new((self.next / self.cols) as i32, (self.next % self.cols) as i32);
        self.next += 1;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.rows * self.cols - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for BoardIterator {}
