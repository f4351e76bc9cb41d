//! Property-based invariants over random boards.

use candytui::matcher::{Axis, find_runs};
use candytui::{Coord, Engine, EngineConfig, FillStrategy, Grid, SwapOutcome, Token};
use candytui::events::BoardEvent;
use proptest::prelude::*;
use std::collections::BTreeSet;

const TYPES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

/// Random grid with some holes, 2-5 types.
fn sparse_grid() -> impl Strategy<Value = Grid> {
    (1usize..8, 1usize..8, 2usize..6).prop_flat_map(|(rows, columns, types)| {
        prop::collection::vec(prop::option::weighted(0.8, 0..types), rows * columns).prop_map(
            move |cells| {
                let cells = cells
                    .into_iter()
                    .map(|c| c.map(|t| Token::ordinary(TYPES[t])))
                    .collect();
                Grid::from_cells(rows, columns, cells).unwrap()
            },
        )
    })
}

/// Freshly filled engine: 3-9 per side, 3-6 types.
fn random_engine() -> impl Strategy<Value = Engine> {
    (3usize..10, 3usize..10, 3usize..7, any::<u64>()).prop_map(|(rows, columns, types, seed)| {
        let config = EngineConfig::with_types(rows, columns, &TYPES[..types]);
        let mut engine = Engine::new(config, seed).unwrap();
        engine.initialize_board(FillStrategy::Random).unwrap();
        engine
    })
}

proptest! {
    #[test]
    fn runs_are_uniform_contiguous_and_maximal(grid in sparse_grid()) {
        for run in find_runs(&grid) {
            prop_assert!(run.len() >= 3);
            let first = grid.token(run.coords[0].row, run.coords[0].column).unwrap();
            for pair in run.coords.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                match run.axis {
                    Axis::Horizontal => prop_assert!(a.row == b.row && a.column + 1 == b.column),
                    Axis::Vertical => prop_assert!(a.column == b.column && a.row + 1 == b.row),
                }
            }
            for at in &run.coords {
                prop_assert!(grid.token(at.row, at.column).unwrap().matches(first));
            }
            // Neither end can be extended.
            let (Some(head), Some(tail)) = (run.coords.first(), run.coords.last()) else {
                continue;
            };
            let (before, after) = match run.axis {
                Axis::Horizontal => (
                    head.column.checked_sub(1).map(|c| Coord::new(head.row, c)),
                    Coord::new(tail.row, tail.column + 1),
                ),
                Axis::Vertical => (
                    head.row.checked_sub(1).map(|r| Coord::new(r, head.column)),
                    Coord::new(tail.row + 1, tail.column),
                ),
            };
            for at in before.into_iter().chain([after]) {
                prop_assert!(!grid.token(at.row, at.column).is_some_and(|t| t.matches(first)));
            }
        }
    }

    #[test]
    fn collapse_keeps_order_and_leaves_no_hole_under_a_token(mut grid in sparse_grid()) {
        let before = grid.clone();
        let columns: BTreeSet<usize> = (0..grid.columns()).collect();
        grid.collapse(&columns).unwrap();
        for column in 0..grid.columns() {
            let kept: Vec<_> = (0..before.rows()).filter_map(|r| before.token(r, column)).collect();
            let now: Vec<_> = (0..grid.rows()).filter_map(|r| grid.token(r, column)).collect();
            prop_assert_eq!(&kept, &now);
            for row in 0..grid.rows() {
                if grid.token(row, column).is_some() && row > 0 {
                    prop_assert!(grid.token(row - 1, column).is_some());
                }
            }
        }
    }

    #[test]
    fn initial_fill_never_leaves_a_run(engine in random_engine()) {
        prop_assert!(engine.grid().is_full());
        prop_assert!(find_runs(engine.grid()).is_empty());
    }

    #[test]
    fn every_swap_ends_settled_or_untouched(
        mut engine in random_engine(),
        pick in any::<prop::sample::Index>(),
        vertical in any::<bool>(),
    ) {
        let cells: Vec<Coord> = engine.grid().coords().collect();
        let a = cells[pick.index(cells.len())];
        let b = if vertical {
            Coord::new(a.row + 1, a.column)
        } else {
            Coord::new(a.row, a.column + 1)
        };
        prop_assume!(engine.grid().contains(b));

        let before = engine.grid().clone();
        match engine.request_swap(a, b).unwrap() {
            SwapOutcome::Resolved { score_delta, events } => {
                prop_assert_eq!(events.last(), Some(&BoardEvent::CascadeSettled));
                prop_assert!(engine.grid().is_full());
                prop_assert!(find_runs(engine.grid()).is_empty());
                let sum: u32 = events
                    .iter()
                    .filter_map(|e| match e {
                        BoardEvent::ScoreChanged { delta, .. } => Some(*delta),
                        _ => None,
                    })
                    .sum();
                prop_assert_eq!(sum, score_delta);
                prop_assert_eq!(engine.score(), score_delta);
            }
            SwapOutcome::Reverted | SwapOutcome::Rejected => {
                prop_assert_eq!(engine.grid(), &before);
                prop_assert_eq!(engine.score(), 0);
            }
        }
    }

    #[test]
    fn two_types_fill_a_single_row(columns in 1usize..12, seed in any::<u64>()) {
        let config = EngineConfig::with_types(1, columns, &TYPES[..2]);
        let mut engine = Engine::new(config, seed).unwrap();
        let grid = engine.initialize_board(FillStrategy::Random).unwrap();
        prop_assert!(find_runs(grid).is_empty());
    }
}
