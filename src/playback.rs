//! Replays engine events onto a view copy of the board, pausing at phase markers.

use candytui::events::{BoardEvent, Phase};
use candytui::{Coord, Grid, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::{Duration, Instant};

/// Pause after a committed swap.
pub const SWAP_MS: u64 = 140;
/// Fade of removed tokens.
pub const REMOVE_FADE_MS: u32 = 260;
/// Fall speed: time per row a token drops.
pub const MOVE_MS_PER_ROW: u64 = 45;
/// Lifetime of a "+N" label.
pub const POPUP_MS: u64 = 900;

/// Floating score label, anchored at the first cell removed in its pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePopup {
    pub at: Coord,
    pub amount: u32,
    pub chain: u32,
    pub born: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Swap,
    Removal,
    Fall,
}

#[derive(Debug, Clone)]
pub struct Playback {
    view: Grid,
    queue: VecDeque<BoardEvent>,
    waiting: Option<(Wait, Instant)>,
    /// Removed cells still on screen while they fade.
    removing: BTreeSet<Coord>,
    /// Rows left to fall per landing cell, and when the fall started.
    falling: BTreeMap<Coord, usize>,
    refills: BTreeSet<Coord>,
    fall_started: Option<Instant>,
    score: u32,
    chain: u32,
    last_chain: u32,
    pending_popup: Option<(u32, u32)>,
    popups: Vec<ScorePopup>,
}

impl Playback {
    pub fn new(view: Grid) -> Self {
        Self {
            view,
            queue: VecDeque::new(),
            waiting: None,
            removing: BTreeSet::new(),
            falling: BTreeMap::new(),
            refills: BTreeSet::new(),
            fall_started: None,
            score: 0,
            chain: 0,
            last_chain: 0,
            pending_popup: None,
            popups: Vec::new(),
        }
    }

    pub fn enqueue(&mut self, events: Vec<BoardEvent>) {
        self.queue.extend(events);
    }

    pub fn is_busy(&self) -> bool {
        !self.queue.is_empty() || self.waiting.is_some()
    }

    pub fn view(&self) -> &Grid {
        &self.view
    }

    pub fn removing(&self) -> &BTreeSet<Coord> {
        &self.removing
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Passes in the most recent cascade.
    pub fn last_chain(&self) -> u32 {
        self.last_chain
    }

    pub fn popups(&self) -> &[ScorePopup] {
        &self.popups
    }

    /// Rows still to fall before the token at `at` lands.
    pub fn fall_offset(&self, at: Coord, now: Instant) -> usize {
        let (Some(distance), Some(started)) = (self.falling.get(&at), self.fall_started) else {
            return 0;
        };
        let fallen = now.saturating_duration_since(started).as_millis() / MOVE_MS_PER_ROW as u128;
        distance.saturating_sub(fallen as usize)
    }

    /// Apply queued events up to the next wait that has not elapsed yet.
    ///
    /// With `animate` off, phase markers never wait. Fails if an event does not fit the view.
    pub fn advance(&mut self, now: Instant, animate: bool) -> Result<()> {
        self.popups
            .retain(|p| now.saturating_duration_since(p.born) < Duration::from_millis(POPUP_MS));

        if let Some((wait, until)) = self.waiting {
            if now < until {
                return Ok(());
            }
            self.waiting = None;
            self.finish(wait)?;
        }

        while let Some(event) = self.queue.pop_front() {
            match event {
                BoardEvent::Swapped { a, b } => {
                    self.view.swap(a, b)?;
                }
                BoardEvent::TokenRemoved(at) => {
                    if let Some((amount, chain)) = self.pending_popup.take() {
                        self.popups.push(ScorePopup {
                            at,
                            amount,
                            chain,
                            born: now,
                        });
                    }
                    self.removing.insert(at);
                }
                BoardEvent::TokenSpawned {
                    at,
                    token,
                    source_offset,
                } => {
                    self.removing.remove(&at);
                    self.view.set(at, token)?;
                    if source_offset > 0 {
                        self.falling.insert(at, source_offset);
                        self.refills.insert(at);
                    }
                }
                BoardEvent::TokenMoved { from, to } => {
                    if let Some(token) = self.view.clear(from)? {
                        self.view.set(to, token)?;
                        self.falling.insert(to, from.row - to.row);
                    }
                }
                BoardEvent::ScoreChanged { delta, total } => {
                    self.score = total;
                    self.chain += 1;
                    self.pending_popup = Some((delta, self.chain));
                }
                BoardEvent::Phase(phase) => {
                    let (wait, ms) = match phase {
                        Phase::AfterSwap => (Wait::Swap, SWAP_MS),
                        Phase::AfterRemoval => (Wait::Removal, u64::from(REMOVE_FADE_MS)),
                        Phase::AfterRefill { max_fall_distance } => {
                            self.stack_refills();
                            self.fall_started = Some(now);
                            (Wait::Fall, max_fall_distance as u64 * MOVE_MS_PER_ROW)
                        }
                    };
                    if animate && ms > 0 {
                        self.waiting = Some((wait, now + Duration::from_millis(ms)));
                        return Ok(());
                    }
                    self.finish(wait)?;
                }
                BoardEvent::CascadeSettled => {
                    self.last_chain = self.chain;
                    self.chain = 0;
                    self.pending_popup = None;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self, wait: Wait) -> Result<()> {
        match wait {
            Wait::Swap => {}
            Wait::Removal => {
                for at in std::mem::take(&mut self.removing) {
                    self.view.clear(at)?;
                }
            }
            Wait::Fall => {
                self.falling.clear();
                self.refills.clear();
                self.fall_started = None;
            }
        }
        Ok(())
    }

    /// Refilled tokens of one column enter together, stacked above the board.
    fn stack_refills(&mut self) {
        let mut per_column: BTreeMap<usize, usize> = BTreeMap::new();
        for at in &self.refills {
            *per_column.entry(at.column).or_default() += 1;
        }
        for at in &self.refills {
            if let Some(&count) = per_column.get(&at.column) {
                self.falling.insert(*at, count);
            }
        }
    }

    /// Drop everything and show `view` as is.
    pub fn reset(&mut self, view: Grid) {
        *self = Self::new(view);
    }
}
