//! Run detection, line-clear expansion and special planning.

use crate::grid::Grid;
use crate::token::{Coord, SpecialKind, Token};
use std::collections::BTreeSet;

/// Shortest run that counts as a match.
pub const MINIMUM_MATCHES: usize = 3;
/// Exact straight length that earns a line clear.
pub const LINE_CLEAR_RUN: usize = 4;
/// Straight length from which a run earns a colour clear instead.
pub const COLOR_CLEAR_RUN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Maximal contiguous same-type sequence along one row or column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRun {
    pub axis: Axis,
    pub type_id: String,
    pub coords: Vec<Coord>,
}

impl MatchRun {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.coords.contains(&at)
    }

    pub fn shape(&self) -> RunShape {
        match self.len() {
            n if n >= COLOR_CLEAR_RUN => RunShape::ColorClear,
            LINE_CLEAR_RUN => RunShape::LineClear,
            _ => RunShape::Plain,
        }
    }
}

/// Bonus eligibility of a single straight run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunShape {
    Plain,
    LineClear,
    ColorClear,
}

/// Cells to remove this pass, and the specials whose effect fired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: BTreeSet<Coord>,
    pub triggered_specials: BTreeSet<Coord>,
}

impl MatchResult {
    /// Union of `runs`; a run holding a line clear grows to its whole row or column.
    pub fn from_runs(grid: &Grid, runs: &[MatchRun]) -> Self {
        let mut out = Self::default();
        for run in runs {
            out.matched.extend(run.coords.iter().copied());
            let fired: Vec<Coord> = run
                .coords
                .iter()
                .copied()
                .filter(|c| grid.token(c.row, c.column).is_some_and(Token::is_line_clear))
                .collect();
            for at in fired {
                out.triggered_specials.insert(at);
                out.matched.extend(line_through(grid, at, run.axis));
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn columns(&self) -> BTreeSet<usize> {
        self.matched.iter().map(|c| c.column).collect()
    }
}

/// Occupied cells of the row (horizontal) or column (vertical) through `at`.
fn line_through(grid: &Grid, at: Coord, axis: Axis) -> Vec<Coord> {
    match axis {
        Axis::Horizontal => (0..grid.columns())
            .filter(|&column| grid.token(at.row, column).is_some())
            .map(|column| Coord::new(at.row, column))
            .collect(),
        Axis::Vertical => (0..grid.rows())
            .filter(|&row| grid.token(row, at.column).is_some())
            .map(|row| Coord::new(row, at.column))
            .collect(),
    }
}

/// Walk one line and push every run of at least `min_len`.
fn scan_line(
    grid: &Grid,
    axis: Axis,
    cells: impl Iterator<Item = Coord>,
    min_len: usize,
    out: &mut Vec<MatchRun>,
) {
    let mut current: Vec<Coord> = Vec::new();
    let mut current_type: Option<&Token> = None;

    let mut flush = |run: &mut Vec<Coord>, token: Option<&Token>| {
        if let Some(token) = token {
            if run.len() >= min_len {
                out.push(MatchRun {
                    axis,
                    type_id: token.type_id().to_string(),
                    coords: std::mem::take(run),
                });
            }
        }
        run.clear();
    };

    for at in cells {
        let token = grid.token(at.row, at.column).filter(|t| !t.is_color_clear());
        match (token, current_type) {
            (Some(t), Some(prev)) if t.matches(prev) => current.push(at),
            (Some(t), _) => {
                flush(&mut current, current_type);
                current.push(at);
                current_type = Some(t);
            }
            (None, _) => {
                flush(&mut current, current_type);
                current_type = None;
            }
        }
    }
    flush(&mut current, current_type);
}

/// Every straight run of at least `min_len`: rows first (bottom up), then columns (left to right).
pub fn straight_runs_of_length(grid: &Grid, min_len: usize) -> Vec<MatchRun> {
    let mut runs = Vec::new();
    for row in 0..grid.rows() {
        let cells = (0..grid.columns()).map(|column| Coord::new(row, column));
        scan_line(grid, Axis::Horizontal, cells, min_len, &mut runs);
    }
    for column in 0..grid.columns() {
        let cells = (0..grid.rows()).map(|row| Coord::new(row, column));
        scan_line(grid, Axis::Vertical, cells, min_len, &mut runs);
    }
    runs
}

pub fn find_runs(grid: &Grid) -> Vec<MatchRun> {
    straight_runs_of_length(grid, MINIMUM_MATCHES)
}

/// Runs containing at least one of `coords`.
pub fn runs_touching(grid: &Grid, coords: &BTreeSet<Coord>) -> Vec<MatchRun> {
    find_runs(grid)
        .into_iter()
        .filter(|run| run.coords.iter().any(|c| coords.contains(c)))
        .collect()
}

pub fn matches_touching(grid: &Grid, coords: &BTreeSet<Coord>) -> BTreeSet<Coord> {
    runs_touching(grid, coords)
        .into_iter()
        .flat_map(|run| run.coords)
        .collect()
}

/// A special earned by one run, to be placed at `anchor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSpecial {
    pub anchor: Coord,
    pub kind: SpecialKind,
    /// Colour of the run that earned it.
    pub type_id: String,
}

/// One special per eligible run; colour clears claim anchors before line clears.
///
/// The anchor is the first run cell found in `preferred` (the swapped cells), else the
/// run's first cell, skipping cells already anchoring another special this pass.
pub fn plan_specials(runs: &[MatchRun], preferred: &BTreeSet<Coord>) -> Vec<PlannedSpecial> {
    let mut planned: Vec<PlannedSpecial> = Vec::new();
    let mut taken: BTreeSet<Coord> = BTreeSet::new();

    for (shape, kind) in [
        (RunShape::ColorClear, SpecialKind::ClearColor),
        (RunShape::LineClear, SpecialKind::ClearLine),
    ] {
        for run in runs.iter().filter(|r| r.shape() == shape) {
            let free = |c: &&Coord| !taken.contains(*c);
            let anchor = run
                .coords
                .iter()
                .filter(free)
                .find(|c| preferred.contains(*c))
                .or_else(|| run.coords.iter().find(free))
                .copied();
            let Some(anchor) = anchor else { continue };
            taken.insert(anchor);
            planned.push(PlannedSpecial {
                anchor,
                kind,
                type_id: run.type_id.clone(),
            });
        }
    }
    planned
}
