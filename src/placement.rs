use crate::{Board, GameConfig, GameError, Position, Result};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

/// Random mine assignment. Sampling is uniform and without replacement;
/// a fixed seed makes it reproducible.
#[derive(Debug, Clone)]
pub struct MinePlacer {
    rng: StdRng,
}

impl Default for MinePlacer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MinePlacer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Builds a fresh board for `config` with mines placed and values computed.
    pub fn generate(&mut self, config: &GameConfig) -> Result<Board> {
        let mut board = Board::new(config.rows, config.cols)?;
        self.place_mines(&mut board, config.mines, &HashSet::new())?;
        board.recompute_all();
        Ok(board)
    }

    /// Turns `count` cells that are neither mines nor in `exceptions` into
    /// mines and returns them. Values are not recomputed here.
    pub fn place_mines(
        &mut self,
        board: &mut Board,
        count: u32,
        exceptions: &HashSet<Position>,
    ) -> Result<Vec<Position>> {
        let candidates = candidates(board, exceptions);
        if count as usize > candidates.len() {
            return Err(GameError::NotEnoughCandidates {
                requested: count,
                available: candidates.len() as u32,
            });
        }

        let chosen: Vec<Position> = candidates
            .choose_multiple(&mut self.rng, count as usize)
            .copied()
            .collect();

        for &pos in &chosen {
            let cell = board.cell_mut(pos)?;
            cell.is_mine = true;
            cell.value = None;
        }

        log::trace!("placed {} mines out of {} candidates", count, candidates.len());
        Ok(chosen)
    }

    /// Moves every mine inside `exempt` somewhere outside of it.
    ///
    /// Returns the cells whose values are now stale: the exempt cells, the
    /// neighbors of every vacated cell, and the non-mine neighbors of every
    /// newly placed mine, without duplicates.
    pub fn relocate_mines(&mut self, board: &mut Board, exempt: &[Position]) -> Result<Vec<Position>> {
        let exempt_set: HashSet<Position> = exempt.iter().copied().collect();
        let to_move: Vec<Position> = exempt_set
            .iter()
            .copied()
            .filter(|&pos| board.get_cell(pos).map_or(false, |cell| cell.is_mine))
            .sorted()
            .collect();

        // Check up front so a failed relocation leaves the board untouched.
        let available = candidates(board, &exempt_set).len();
        if to_move.len() > available {
            return Err(GameError::NotEnoughCandidates {
                requested: to_move.len() as u32,
                available: available as u32,
            });
        }

        let mut affected: Vec<Position> = exempt.to_vec();
        for &pos in &to_move {
            board.cell_mut(pos)?.is_mine = false;
            affected.push(pos);
            affected.extend(board.neighbors_of(pos));
        }

        let placed = self.place_mines(board, to_move.len() as u32, &exempt_set)?;
        for &pos in &placed {
            affected.extend(
                board
                    .neighbor_cells(pos)
                    .filter(|cell| !cell.is_mine)
                    .map(|cell| cell.position),
            );
        }

        log::debug!("relocated {} mines out of {} exempt cells", to_move.len(), exempt_set.len());
        Ok(affected.into_iter().unique().collect())
    }
}

/// Non-mine cells outside `exceptions`, in row-major order.
fn candidates(board: &Board, exceptions: &HashSet<Position>) -> Vec<Position> {
    board
        .cells()
        .filter(|cell| !cell.is_mine && !exceptions.contains(&cell.position))
        .map(|cell| cell.position)
        .collect()
}
