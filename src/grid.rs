//! Board storage: R x C cells of `Option<Token>`, bounds-checked.

use crate::error::{BoardError, Result};
use crate::token::{Coord, Token};
use std::collections::BTreeSet;

/// One token moved by gravity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMove {
    pub from: Coord,
    pub to: Coord,
    pub token: Token,
}

impl TokenMove {
    /// Rows fallen.
    pub fn distance(&self) -> usize {
        self.from.row - self.to.row
    }
}

/// Result of [`Grid::collapse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collapse {
    pub moved: Vec<TokenMove>,
    pub max_fall_distance: usize,
}

/// Grid of cells. Row 0 is the bottom; `cells` is row-major from the bottom row up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Option<Token>>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
        }
    }

    /// Build from row-major cells (bottom row first). Length must be `rows * columns`.
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<Option<Token>>) -> Result<Self> {
        if cells.len() != rows * columns {
            return Err(BoardError::InvalidLevelData(format!(
                "expected {} cells for a {}x{} board, got {}",
                rows * columns,
                rows,
                columns,
                cells.len()
            )));
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.rows && at.column < self.columns
    }

    fn index(&self, at: Coord) -> Result<usize> {
        if self.contains(at) {
            Ok(at.row * self.columns + at.column)
        } else {
            Err(BoardError::OutOfBounds {
                row: at.row,
                column: at.column,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    pub fn get(&self, at: Coord) -> Result<Option<&Token>> {
        let i = self.index(at)?;
        Ok(self.cells[i].as_ref())
    }

    /// Unchecked-style lookup for scans: out of range reads as empty.
    #[inline]
    pub fn token(&self, row: usize, column: usize) -> Option<&Token> {
        if row < self.rows && column < self.columns {
            self.cells[row * self.columns + column].as_ref()
        } else {
            None
        }
    }

    /// Put `token` at `at`, returning whatever was there.
    pub fn set(&mut self, at: Coord, token: Token) -> Result<Option<Token>> {
        let i = self.index(at)?;
        Ok(self.cells[i].replace(token))
    }

    pub fn clear(&mut self, at: Coord) -> Result<Option<Token>> {
        let i = self.index(at)?;
        Ok(self.cells[i].take())
    }

    /// Exchange two cells. Both coordinates are checked before anything moves.
    pub fn swap(&mut self, a: Coord, b: Coord) -> Result<()> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Apply gravity to the given columns: tokens slide towards row 0 keeping their order.
    pub fn collapse(&mut self, columns: &BTreeSet<usize>) -> Result<Collapse> {
        let mut out = Collapse::default();
        for &column in columns {
            if column >= self.columns {
                return Err(BoardError::OutOfBounds {
                    row: 0,
                    column,
                    rows: self.rows,
                    columns: self.columns,
                });
            }
            let mut write = 0;
            for row in 0..self.rows {
                let from = Coord::new(row, column);
                let Some(token) = self.cells[row * self.columns + column].take() else {
                    continue;
                };
                let to = Coord::new(write, column);
                if row != write {
                    let moved = TokenMove {
                        from,
                        to,
                        token: token.clone(),
                    };
                    out.max_fall_distance = out.max_fall_distance.max(moved.distance());
                    out.moved.push(moved);
                }
                self.cells[write * self.columns + column] = Some(token);
                write += 1;
            }
        }
        Ok(out)
    }

    /// Empty rows of `column`, ordered top to bottom.
    pub fn empty_cells_in_column(&self, column: usize) -> Result<Vec<usize>> {
        if column >= self.columns {
            return Err(BoardError::OutOfBounds {
                row: 0,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok((0..self.rows)
            .rev()
            .filter(|&row| self.token(row, column).is_none())
            .collect())
    }

    /// Every coordinate, row-major from the bottom row.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| Coord::new(row, column)))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn count_where(&self, mut pred: impl FnMut(&Token) -> bool) -> usize {
        self.cells.iter().flatten().filter(|t| pred(t)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: &str) -> Token {
        Token::ordinary(id)
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut g = Grid::new(2, 3);
        assert!(matches!(
            g.get(Coord::new(2, 0)),
            Err(BoardError::OutOfBounds { row: 2, .. })
        ));
        assert!(g.set(Coord::new(0, 3), t("a")).is_err());
        assert!(g.clear(Coord::new(5, 5)).is_err());
    }

    #[test]
    fn swap_checks_both_before_moving() {
        let mut g = Grid::new(2, 2);
        g.set(Coord::new(0, 0), t("a")).unwrap();
        assert!(g.swap(Coord::new(0, 0), Coord::new(0, 9)).is_err());
        assert_eq!(g.get(Coord::new(0, 0)).unwrap(), Some(&t("a")));

        g.set(Coord::new(0, 1), t("b")).unwrap();
        g.swap(Coord::new(0, 0), Coord::new(0, 1)).unwrap();
        assert_eq!(g.get(Coord::new(0, 0)).unwrap(), Some(&t("b")));
        assert_eq!(g.get(Coord::new(0, 1)).unwrap(), Some(&t("a")));
    }

    #[test]
    fn collapse_keeps_order_and_reports_distance() {
        let mut g = Grid::new(5, 1);
        g.set(Coord::new(1, 0), t("a")).unwrap();
        g.set(Coord::new(3, 0), t("b")).unwrap();
        g.set(Coord::new(4, 0), t("c")).unwrap();

        let info = g.collapse(&BTreeSet::from([0])).unwrap();
        assert_eq!(g.token(0, 0), Some(&t("a")));
        assert_eq!(g.token(1, 0), Some(&t("b")));
        assert_eq!(g.token(2, 0), Some(&t("c")));
        assert_eq!(g.token(3, 0), None);
        assert_eq!(info.moved.len(), 3);
        let distances: Vec<_> = info.moved.iter().map(TokenMove::distance).collect();
        assert_eq!(distances, vec![1, 2, 2]);
        assert_eq!(info.max_fall_distance, 2);
        assert_eq!(g.empty_cells_in_column(0).unwrap(), vec![4, 3]);
    }

    #[test]
    fn collapse_leaves_untouched_columns_alone() {
        let mut g = Grid::new(3, 2);
        g.set(Coord::new(2, 0), t("a")).unwrap();
        g.set(Coord::new(2, 1), t("b")).unwrap();
        let info = g.collapse(&BTreeSet::from([1])).unwrap();
        assert_eq!(info.moved.len(), 1);
        assert_eq!(g.token(2, 0), Some(&t("a")));
        assert_eq!(g.token(0, 1), Some(&t("b")));
    }

    #[test]
    fn count_where_skips_empty_cells() {
        let mut g = Grid::new(2, 2);
        g.set(Coord::new(0, 0), t("a")).unwrap();
        g.set(Coord::new(0, 1), Token::line_clear("a")).unwrap();
        g.set(Coord::new(1, 1), Token::color_clear()).unwrap();
        assert_eq!(g.count_where(|_| true), 3);
        assert_eq!(g.count_where(|tok| tok.type_id() == "a"), 2);
        assert_eq!(g.count_where(Token::is_color_clear), 1);
    }
}
