//! Resolve loop: score, remove, spawn specials, collapse, refill, rescan until settled.

use crate::config::EngineConfig;
use crate::error::{BoardError, Result};
use crate::events::{BoardEvent, Phase};
use crate::grid::Grid;
use crate::matcher::{self, MINIMUM_MATCHES, MatchResult, MatchRun};
use crate::source::RandomTokenSource;
use crate::token::{Coord, Token};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Transient counters of one cascade. Lives on the engine, reset on every settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeState {
    /// Number of the pass being resolved, starting at 1.
    pub chain_depth: u32,
    pub accumulated_score: u32,
    /// Set once a special fired; no new specials until the cascade settles.
    pub suppress_special_creation: bool,
}

impl Default for CascadeState {
    fn default() -> Self {
        Self {
            chain_depth: 1,
            accumulated_score: 0,
            suppress_special_creation: false,
        }
    }
}

/// Runs found for one pass, with their flattened (and line-expanded) cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassMatches {
    pub runs: Vec<MatchRun>,
    pub result: MatchResult,
}

impl PassMatches {
    /// Every run on the board.
    pub fn scan(grid: &Grid) -> Self {
        Self::from_runs(grid, matcher::find_runs(grid))
    }

    /// Runs through at least one of `coords`.
    pub fn touching(grid: &Grid, coords: &BTreeSet<Coord>) -> Self {
        Self::from_runs(grid, matcher::runs_touching(grid, coords))
    }

    fn from_runs(grid: &Grid, runs: Vec<MatchRun>) -> Self {
        let result = MatchResult::from_runs(grid, &runs);
        Self { runs, result }
    }

    pub fn is_match(&self) -> bool {
        self.result.len() >= MINIMUM_MATCHES
    }
}

/// Borrowed view of one engine while a cascade resolves.
pub(crate) struct Cascade<'a> {
    pub grid: &'a mut Grid,
    pub source: &'a mut RandomTokenSource,
    pub config: &'a EngineConfig,
    pub state: &'a mut CascadeState,
    pub score: &'a mut u32,
    pub events: &'a mut Vec<BoardEvent>,
}

impl Cascade<'_> {
    /// Resolve passes until the board settles. Returns the points earned by the whole cascade.
    ///
    /// `preferred` holds the swapped cells; they anchor specials in the first pass only.
    pub fn run(&mut self, mut pass: PassMatches, mut preferred: BTreeSet<Coord>) -> Result<u32> {
        while pass.is_match() {
            self.resolve_pass(&pass, &preferred)?;
            pass = PassMatches::scan(self.grid);
            preferred.clear();
            self.state.chain_depth += 1;
        }

        let earned = self.state.accumulated_score;
        info!(
            passes = self.state.chain_depth - 1,
            earned,
            total = *self.score,
            "board settled"
        );
        *self.state = CascadeState::default();
        self.events.push(BoardEvent::CascadeSettled);
        Ok(earned)
    }

    /// Swap-activated colour clear: take every `target_type` token plus the activator.
    pub fn activate_color_clear(&mut self, activator: Coord, target_type: &str) -> Result<u32> {
        let targets: BTreeSet<Coord> = self
            .grid
            .coords()
            .filter(|&c| {
                c == activator
                    || self
                        .grid
                        .token(c.row, c.column)
                        .is_some_and(|t| t.type_id() == target_type)
            })
            .collect();
        debug!(%activator, target_type, removed = targets.len(), "colour clear");

        self.award(self.config.scoring.score_for_color_clear());
        self.state.suppress_special_creation = true;
        for &at in &targets {
            self.remove(at)?;
        }
        self.events.push(BoardEvent::Phase(Phase::AfterRemoval));
        self.gravity_and_refill(&targets.iter().map(|c| c.column).collect())?;
        self.state.chain_depth += 1;

        let pass = PassMatches::scan(self.grid);
        self.run(pass, BTreeSet::new())
    }

    fn resolve_pass(&mut self, pass: &PassMatches, preferred: &BTreeSet<Coord>) -> Result<()> {
        let matched = &pass.result.matched;
        let delta = self
            .config
            .scoring
            .score_for_pass(matched.len(), self.state.chain_depth);
        debug!(
            depth = self.state.chain_depth,
            matched = matched.len(),
            runs = pass.runs.len(),
            delta,
            "resolve pass"
        );
        self.award(delta);

        if !pass.result.triggered_specials.is_empty() {
            self.state.suppress_special_creation = true;
        }
        let specials = if self.state.suppress_special_creation {
            Vec::new()
        } else {
            self.build_specials(&pass.runs, preferred)
        };
        let anchors: BTreeSet<Coord> = specials.iter().map(|(at, _)| *at).collect();

        for &at in matched.difference(&anchors) {
            self.remove(at)?;
        }
        for (at, token) in specials {
            self.grid.set(at, token.clone())?;
            self.events.push(BoardEvent::TokenSpawned {
                at,
                token,
                source_offset: 0,
            });
        }
        self.events.push(BoardEvent::Phase(Phase::AfterRemoval));

        self.gravity_and_refill(&pass.result.columns())
    }

    /// Planned specials that have a definition. Missing ones are logged and skipped.
    fn build_specials(
        &self,
        runs: &[MatchRun],
        preferred: &BTreeSet<Coord>,
    ) -> Vec<(Coord, Token)> {
        matcher::plan_specials(runs, preferred)
            .into_iter()
            .filter_map(|plan| {
                match self.config.specials.build(plan.kind, &plan.type_id) {
                    Ok(token) => Some((plan.anchor, token)),
                    Err(err @ BoardError::Configuration { .. }) => {
                        warn!(%err, anchor = %plan.anchor, "special not created");
                        None
                    }
                    Err(err) => {
                        warn!(%err, "unexpected error while building special");
                        None
                    }
                }
            })
            .collect()
    }

    fn award(&mut self, delta: u32) {
        self.state.accumulated_score = self.state.accumulated_score.saturating_add(delta);
        *self.score = self.score.saturating_add(delta);
        self.events.push(BoardEvent::ScoreChanged {
            delta,
            total: *self.score,
        });
    }

    fn remove(&mut self, at: Coord) -> Result<()> {
        if self.grid.clear(at)?.is_some() {
            self.events.push(BoardEvent::TokenRemoved(at));
        }
        Ok(())
    }

    /// Collapse `columns`, then refill their empty cells from the top with random tokens.
    fn gravity_and_refill(&mut self, columns: &BTreeSet<usize>) -> Result<()> {
        let collapse = self.grid.collapse(columns)?;
        self.events.extend(
            collapse
                .moved
                .iter()
                .map(|m| BoardEvent::TokenMoved { from: m.from, to: m.to }),
        );

        let rows = self.grid.rows();
        let mut max_fall_distance = collapse.max_fall_distance;
        for &column in columns {
            for row in self.grid.empty_cells_in_column(column)? {
                let at = Coord::new(row, column);
                let token = self.source.next_ordinary_token();
                let source_offset = rows - row;
                max_fall_distance = max_fall_distance.max(source_offset);
                self.grid.set(at, token.clone())?;
                self.events.push(BoardEvent::TokenSpawned {
                    at,
                    token,
                    source_offset,
                });
            }
        }
        self.events
            .push(BoardEvent::Phase(Phase::AfterRefill { max_fall_distance }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::SpecialKind;

    fn setup(rows: usize, columns: usize, fill: &[(usize, usize, Token)]) -> (Grid, EngineConfig) {
        let config = EngineConfig::with_types(rows, columns, &["a", "b", "c", "d", "e", "f"]);
        let mut grid = Grid::new(rows, columns);
        for (row, column, token) in fill {
            grid.set(Coord::new(*row, *column), token.clone()).unwrap();
        }
        (grid, config)
    }

    #[test]
    fn settles_and_resets_state() {
        let a = Token::ordinary("a");
        let (mut grid, config) = setup(
            4,
            3,
            &[(0, 0, a.clone()), (0, 1, a.clone()), (0, 2, a)],
        );
        let mut source = RandomTokenSource::new(config.token_types.clone(), 3);
        let mut state = CascadeState::default();
        let mut score = 0;
        let mut events = Vec::new();
        let pass = PassMatches::scan(&grid);
        let earned = Cascade {
            grid: &mut grid,
            source: &mut source,
            config: &config,
            state: &mut state,
            score: &mut score,
            events: &mut events,
        }
        .run(pass, BTreeSet::new())
        .unwrap();

        assert!(earned >= 60);
        assert_eq!(earned, score);
        assert_eq!(state, CascadeState::default());
        assert_eq!(events.last(), Some(&BoardEvent::CascadeSettled));
        assert!(matcher::find_runs(&grid).is_empty());
        assert!(grid.is_full());
    }

    #[test]
    fn missing_definition_degrades_to_plain_removal() {
        let a = Token::ordinary("a");
        let (mut grid, mut config) = setup(
            6,
            4,
            &[(0, 0, a.clone()), (0, 1, a.clone()), (0, 2, a.clone()), (0, 3, a)],
        );
        config.specials.line_clear_types.clear();
        let mut source = RandomTokenSource::new(config.token_types.clone(), 11);
        let mut state = CascadeState::default();
        let mut score = 0;
        let mut events = Vec::new();
        let pass = PassMatches::scan(&grid);
        Cascade {
            grid: &mut grid,
            source: &mut source,
            config: &config,
            state: &mut state,
            score: &mut score,
            events: &mut events,
        }
        .run(pass, BTreeSet::new())
        .unwrap();

        let first_pass: Vec<_> = events
            .iter()
            .take_while(|e| !e.is_phase())
            .collect();
        let removed = first_pass
            .iter()
            .filter(|e| matches!(e, BoardEvent::TokenRemoved(_)))
            .count();
        assert_eq!(removed, 4);
        assert!(!first_pass.iter().any(|e| matches!(
            e,
            BoardEvent::TokenSpawned { token, .. } if token.special() != SpecialKind::None
        )));
    }
}
