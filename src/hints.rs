//! Potential-move search for hints and dead-board detection.

use crate::grid::Grid;
use crate::matcher;
use crate::token::Coord;
use std::collections::BTreeSet;

/// Every adjacent swap that would resolve, each pair ordered lower coordinate first.
///
/// A swap involving a colour clear always counts. Any other swap counts when it leaves
/// a run through one of the two cells.
pub fn find_potential_moves(grid: &Grid) -> BTreeSet<(Coord, Coord)> {
    let mut scratch = grid.clone();
    let mut moves = BTreeSet::new();
    for a in grid.coords() {
        for b in [Coord::new(a.row + 1, a.column), Coord::new(a.row, a.column + 1)] {
            if grid.contains(b) && is_potential_move(&mut scratch, a, b) {
                moves.insert((a, b));
            }
        }
    }
    moves
}

/// Try the swap on `scratch` and put it back.
fn is_potential_move(scratch: &mut Grid, a: Coord, b: Coord) -> bool {
    let (Some(ta), Some(tb)) = (scratch.token(a.row, a.column), scratch.token(b.row, b.column))
    else {
        return false;
    };
    if ta.is_color_clear() || tb.is_color_clear() {
        return true;
    }
    let swapped = BTreeSet::from([a, b]);
    if ta == tb {
        return completes_match(scratch, &swapped);
    }
    if scratch.swap(a, b).is_err() {
        return false;
    }
    let found = completes_match(scratch, &swapped);
    scratch.swap(a, b).is_ok() && found
}

fn completes_match(grid: &Grid, swapped: &BTreeSet<Coord>) -> bool {
    matcher::matches_touching(grid, swapped).len() >= matcher::MINIMUM_MATCHES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn grid(rows_top_first: &[&str]) -> Grid {
        let rows = rows_top_first.len();
        let columns = rows_top_first[0].len();
        let mut g = Grid::new(rows, columns);
        for (i, line) in rows_top_first.iter().enumerate() {
            let row = rows - 1 - i;
            for (column, ch) in line.chars().enumerate() {
                let token = match ch {
                    '.' => continue,
                    '*' => Token::color_clear(),
                    c => Token::ordinary(c.to_string()),
                };
                g.set(Coord::new(row, column), token).unwrap();
            }
        }
        g
    }

    #[test]
    fn dead_board_and_completing_swap() {
        let g = grid(&["cdc", "aba", "cdc"]);
        let moves = find_potential_moves(&g);
        assert!(moves.is_empty());

        let g = grid(&["abcd", "aacd", "bdab"]);
        let moves = find_potential_moves(&g);
        assert!(moves.contains(&(Coord::new(0, 2), Coord::new(1, 2))));
        for (a, b) in &moves {
            assert!(a < b);
            assert!(a.is_adjacent(*b));
        }
    }

    #[test]
    fn colour_clear_next_to_anything_is_a_move() {
        let g = grid(&["a*", "bc"]);
        let moves = find_potential_moves(&g);
        assert_eq!(
            moves,
            BTreeSet::from([
                (Coord::new(0, 1), Coord::new(1, 1)),
                (Coord::new(1, 0), Coord::new(1, 1)),
            ])
        );
    }

    #[test]
    fn search_leaves_grid_untouched() {
        let g = grid(&["abab", "baba", "aabb"]);
        let before = g.clone();
        let _ = find_potential_moves(&g);
        assert_eq!(g, before);
    }

    #[test]
    fn empty_cells_are_never_swapped() {
        let g = grid(&["a.a", "bab"]);
        let moves = find_potential_moves(&g);
        assert!(!moves.iter().any(|(a, b)| *a == Coord::new(1, 1) || *b == Coord::new(1, 1)));
    }
}
