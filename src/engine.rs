//! Board engine: selection state machine, swap resolution and board setup.

use crate::cascade::{Cascade, CascadeState, PassMatches};
use crate::config::EngineConfig;
use crate::error::{BoardError, Result};
use crate::events::{BoardEvent, Phase};
use crate::grid::Grid;
use crate::hints;
use crate::level::FillStrategy;
use crate::source::RandomTokenSource;
use crate::token::Coord;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapState {
    #[default]
    Idle,
    /// First cell picked, waiting for the second.
    Selecting(Coord),
    /// Held for the duration of `request_swap`. Re-entrant calls in this state are rejected.
    Resolving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Not a legal move; nothing changed.
    Rejected,
    /// Legal but produced no match; the swap was undone.
    Reverted,
    /// The swap committed and the board settled.
    Resolved {
        score_delta: u32,
        events: Vec<BoardEvent>,
    },
}

impl SwapOutcome {
    pub fn events(&self) -> &[BoardEvent] {
        match self {
            Self::Resolved { events, .. } => events,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    source: RandomTokenSource,
    state: SwapState,
    score: u32,
    cascade: CascadeState,
}

impl Engine {
    /// An engine with an empty board. Call [`Engine::initialize_board`] before playing.
    pub fn new(config: EngineConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let source = RandomTokenSource::new(config.token_types.clone(), seed);
        let grid = Grid::new(config.rows, config.columns);
        Ok(Self {
            config,
            grid,
            source,
            state: SwapState::Idle,
            score: 0,
            cascade: CascadeState::default(),
        })
    }

    /// Replace the board and reset score and selection. On error the old board stays.
    #[instrument(skip_all, fields(random = matches!(strategy, FillStrategy::Random)))]
    pub fn initialize_board(&mut self, strategy: FillStrategy) -> Result<&Grid> {
        let grid = match strategy {
            FillStrategy::Random => {
                let mut grid = Grid::new(self.config.rows, self.config.columns);
                self.source.fill_initial(&mut grid)?;
                grid
            }
            FillStrategy::FromLevelData(level) => level.to_grid(&self.config)?,
        };
        self.grid = grid;
        self.score = 0;
        self.state = SwapState::Idle;
        self.cascade = CascadeState::default();
        info!(
            rows = self.grid.rows(),
            columns = self.grid.columns(),
            "board initialized"
        );
        Ok(&self.grid)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Feed one picked cell into the selection state machine.
    ///
    /// Returns `None` while a selection is only being made or cancelled.
    pub fn select(&mut self, at: Coord) -> Result<Option<SwapOutcome>> {
        self.check_bounds(at)?;
        match self.state {
            SwapState::Idle => {
                self.state = SwapState::Selecting(at);
                Ok(None)
            }
            SwapState::Selecting(first) if first == at => {
                self.state = SwapState::Idle;
                Ok(None)
            }
            SwapState::Selecting(first) => self.request_swap(first, at).map(Some),
            SwapState::Resolving => Ok(Some(SwapOutcome::Rejected)),
        }
    }

    pub fn cancel_selection(&mut self) {
        if let SwapState::Selecting(_) = self.state {
            self.state = SwapState::Idle;
        }
    }

    /// Swap two cells and resolve everything that follows.
    #[instrument(skip(self), fields(score = self.score))]
    pub fn request_swap(&mut self, a: Coord, b: Coord) -> Result<SwapOutcome> {
        if self.state == SwapState::Resolving {
            return Ok(SwapOutcome::Rejected);
        }
        self.check_bounds(a)?;
        self.check_bounds(b)?;
        if let Err(err) = self.check_move(a, b) {
            debug!(%err, "swap rejected");
            self.state = SwapState::Idle;
            return Ok(SwapOutcome::Rejected);
        }

        self.state = SwapState::Resolving;
        let outcome = self.resolve(a, b);
        self.state = SwapState::Idle;
        outcome
    }

    /// Every swap that would currently resolve.
    pub fn potential_moves(&self) -> BTreeSet<(Coord, Coord)> {
        hints::find_potential_moves(&self.grid)
    }

    pub fn hint(&self) -> Option<(Coord, Coord)> {
        self.potential_moves().into_iter().next()
    }

    fn resolve(&mut self, a: Coord, b: Coord) -> Result<SwapOutcome> {
        let first = self.grid.get(a)?.cloned();
        let second = self.grid.get(b)?.cloned();
        let (Some(first), Some(second)) = (first, second) else {
            return Err(BoardError::InvalidMove { a, b });
        };
        let mut events = Vec::new();

        let activation = if first.is_color_clear() {
            Some((a, second.type_id()))
        } else if second.is_color_clear() {
            Some((b, first.type_id()))
        } else {
            None
        };
        if let Some((activator, target)) = activation {
            let score_delta = self
                .cascade(&mut events)
                .activate_color_clear(activator, target)?;
            return Ok(SwapOutcome::Resolved {
                score_delta,
                events,
            });
        }

        self.grid.swap(a, b)?;
        events.push(BoardEvent::Swapped { a, b });
        events.push(BoardEvent::Phase(Phase::AfterSwap));

        let swapped = BTreeSet::from([a, b]);
        let pass = PassMatches::touching(&self.grid, &swapped);
        if !pass.is_match() {
            self.grid.swap(a, b)?;
            debug!("no match, swap reverted");
            return Ok(SwapOutcome::Reverted);
        }

        let score_delta = self.cascade(&mut events).run(pass, swapped)?;
        Ok(SwapOutcome::Resolved {
            score_delta,
            events,
        })
    }

    fn cascade<'a>(&'a mut self, events: &'a mut Vec<BoardEvent>) -> Cascade<'a> {
        Cascade {
            grid: &mut self.grid,
            source: &mut self.source,
            config: &self.config,
            state: &mut self.cascade,
            score: &mut self.score,
            events,
        }
    }

    fn check_bounds(&self, at: Coord) -> Result<()> {
        self.grid.get(at).map(|_| ())
    }

    fn check_move(&self, a: Coord, b: Coord) -> Result<()> {
        let occupied = |c: Coord| self.grid.token(c.row, c.column).is_some();
        if a.is_adjacent(b) && occupied(a) && occupied(b) {
            Ok(())
        } else {
            Err(BoardError::InvalidMove { a, b })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelData;
    use crate::matcher::find_runs;

    fn engine_with(level: &str) -> Engine {
        let data = LevelData::parse(level).unwrap();
        let config = EngineConfig::with_types(data.rows(), data.columns(), &["a", "b", "c", "d"]);
        let mut engine = Engine::new(config, 5).unwrap();
        engine
            .initialize_board(FillStrategy::FromLevelData(data))
            .unwrap();
        engine
    }

    #[test]
    fn rejects_invalid_settings() {
        let config = EngineConfig::with_types(4, 4, &["a"]);
        assert!(matches!(
            Engine::new(config, 0),
            Err(BoardError::InvalidSettings(_))
        ));
    }

    #[test]
    fn random_board_is_full_and_quiet() {
        let mut engine = Engine::new(EngineConfig::default(), 42).unwrap();
        let grid = engine.initialize_board(FillStrategy::Random).unwrap();
        assert!(grid.is_full());
        assert!(find_runs(grid).is_empty());
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn selection_state_machine() {
        let mut engine = engine_with("a b c\nb c a\nc a b");
        assert_eq!(engine.select(Coord::new(0, 0)).unwrap(), None);
        assert_eq!(engine.state(), SwapState::Selecting(Coord::new(0, 0)));

        // Same cell again cancels.
        assert_eq!(engine.select(Coord::new(0, 0)).unwrap(), None);
        assert_eq!(engine.state(), SwapState::Idle);

        engine.select(Coord::new(0, 0)).unwrap();
        engine.cancel_selection();
        assert_eq!(engine.state(), SwapState::Idle);

        engine.select(Coord::new(0, 0)).unwrap();
        let before = engine.grid().clone();
        assert_eq!(
            engine.select(Coord::new(2, 2)).unwrap(),
            Some(SwapOutcome::Rejected)
        );
        assert_eq!(engine.state(), SwapState::Idle);
        assert_eq!(engine.grid(), &before);
    }

    #[test]
    fn out_of_range_selection_keeps_state() {
        let mut engine = engine_with("a b c\nb c a\nc a b");
        engine.select(Coord::new(1, 1)).unwrap();
        assert!(matches!(
            engine.select(Coord::new(3, 0)),
            Err(BoardError::OutOfBounds { .. })
        ));
        assert_eq!(engine.state(), SwapState::Selecting(Coord::new(1, 1)));
        assert!(engine.request_swap(Coord::new(0, 0), Coord::new(0, 9)).is_err());
    }

    #[test]
    fn swap_without_match_reverts() {
        let mut engine = engine_with("a b c\nb c a\nc a b");
        let before = engine.grid().clone();
        let outcome = engine
            .request_swap(Coord::new(0, 0), Coord::new(0, 1))
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Reverted);
        assert_eq!(engine.grid(), &before);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.state(), SwapState::Idle);
    }

    #[test]
    fn matching_swap_scores_and_settles() {
        // Bottom row becomes a a a after swapping (0,2) with (1,2).
        let mut engine = engine_with("c d b c\nd b a d\na a b c");
        let outcome = engine
            .request_swap(Coord::new(0, 2), Coord::new(1, 2))
            .unwrap();
        let SwapOutcome::Resolved {
            score_delta,
            events,
        } = outcome
        else {
            panic!("expected a resolved swap, got {outcome:?}");
        };
        assert!(score_delta >= 60);
        assert_eq!(engine.score(), score_delta);
        assert_eq!(
            &events[..2],
            &[
                BoardEvent::Swapped {
                    a: Coord::new(0, 2),
                    b: Coord::new(1, 2)
                },
                BoardEvent::Phase(Phase::AfterSwap)
            ]
        );
        assert_eq!(events.last(), Some(&BoardEvent::CascadeSettled));
        assert!(find_runs(engine.grid()).is_empty());
    }

    #[test]
    fn failed_level_load_keeps_board() {
        let mut engine = engine_with("a b c\nb c a\nc a b");
        let before = engine.grid().clone();
        let bad = LevelData::parse("a b c\nb x a\nc a b").unwrap();
        assert!(matches!(
            engine.initialize_board(FillStrategy::FromLevelData(bad)),
            Err(BoardError::InvalidLevelData(_))
        ));
        assert_eq!(engine.grid(), &before);
    }

    #[test]
    fn hint_is_a_potential_move() {
        let engine = engine_with("c d b c\nd b a d\na a b c");
        let hint = engine.hint().unwrap();
        assert!(engine.potential_moves().contains(&hint));
    }

    #[test]
    fn calls_during_resolution_are_rejected() {
        let mut engine = engine_with("c d b c\nd b a d\na a b c");
        let before = engine.grid().clone();
        engine.state = SwapState::Resolving;

        assert_eq!(
            engine.request_swap(Coord::new(0, 2), Coord::new(1, 2)).unwrap(),
            SwapOutcome::Rejected
        );
        assert_eq!(
            engine.select(Coord::new(0, 0)).unwrap(),
            Some(SwapOutcome::Rejected)
        );
        assert_eq!(engine.state(), SwapState::Resolving);
        assert_eq!(engine.grid(), &before);
    }
}
