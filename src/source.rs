//! Seeded random supply of ordinary tokens.

use crate::error::{BoardError, Result};
use crate::grid::Grid;
use crate::token::{Coord, Token};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Whole-board restarts allowed before an initial fill is declared impossible.
const MAX_FILL_ATTEMPTS: usize = 64;

#[derive(Debug, Clone)]
pub struct RandomTokenSource {
    types: Vec<String>,
    rng: StdRng,
}

impl RandomTokenSource {
    pub fn new(types: Vec<String>, seed: u64) -> Self {
        Self {
            types,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw over the configured ordinary types.
    pub fn next_ordinary_token(&mut self) -> Token {
        let i = self.rng.random_range(0..self.types.len());
        Token::ordinary(self.types[i].clone())
    }

    /// Fill every cell without leaving a run of 3 anywhere.
    ///
    /// Each candidate is redrawn while it would complete a run with the two cells to its
    /// left or the two cells below it.
    pub fn fill_initial(&mut self, grid: &mut Grid) -> Result<()> {
        for attempt in 1..=MAX_FILL_ATTEMPTS {
            if self.try_fill(grid)? {
                return Ok(());
            }
            debug!(attempt, "initial fill hit a dead end, restarting");
        }
        Err(BoardError::InvalidSettings(format!(
            "could not fill a {}x{} board without runs using {} types",
            grid.rows(),
            grid.columns(),
            self.types.len()
        )))
    }

    fn try_fill(&mut self, grid: &mut Grid) -> Result<bool> {
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let left = (column >= 2)
                    .then(|| pair_type(grid, Coord::new(row, column - 1), Coord::new(row, column - 2)))
                    .flatten();
                let below = (row >= 2)
                    .then(|| pair_type(grid, Coord::new(row - 1, column), Coord::new(row - 2, column)))
                    .flatten();
                let blocked = |t: &str| left.as_deref() == Some(t) || below.as_deref() == Some(t);
                if self.types.iter().all(|t| blocked(t.as_str())) {
                    return Ok(false);
                }
                let mut candidate = self.next_ordinary_token();
                while blocked(candidate.type_id()) {
                    candidate = self.next_ordinary_token();
                }
                grid.set(Coord::new(row, column), candidate)?;
            }
        }
        Ok(true)
    }
}

/// Type shared by two ordinary cells, if they agree.
fn pair_type(grid: &Grid, a: Coord, b: Coord) -> Option<String> {
    let first = grid.token(a.row, a.column)?;
    let second = grid.token(b.row, b.column)?;
    first.matches(second).then(|| first.type_id().to_string())
}
