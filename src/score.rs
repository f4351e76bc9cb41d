//! Scoring rules. Pure functions over configured constants.

use crate::matcher::MINIMUM_MATCHES;

/// Points for each matched token beyond the first two in a pass.
pub const DEFAULT_MATCH_BASE_SCORE: u32 = 60;
/// Flat bonus for every pass from the second one of a cascade onwards.
pub const DEFAULT_CHAIN_BONUS: u32 = 1000;
/// Flat bonus for a colour-clear activation, however many tokens it takes.
pub const DEFAULT_COLOR_CLEAR_BONUS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRules {
    pub match_base_score: u32,
    pub chain_bonus: u32,
    pub color_clear_bonus: u32,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            match_base_score: DEFAULT_MATCH_BASE_SCORE,
            chain_bonus: DEFAULT_CHAIN_BONUS,
            color_clear_bonus: DEFAULT_COLOR_CLEAR_BONUS,
        }
    }
}

impl ScoreRules {
    pub fn score_for_match(&self, matched_count: usize) -> u32 {
        if matched_count < MINIMUM_MATCHES {
            return 0;
        }
        (matched_count as u32 - 2).saturating_mul(self.match_base_score)
    }

    /// One resolve pass; `chain_depth` starts at 1.
    pub fn score_for_pass(&self, matched_count: usize, chain_depth: u32) -> u32 {
        let bonus = if chain_depth >= 2 { self.chain_bonus } else { 0 };
        self.score_for_match(matched_count).saturating_add(bonus)
    }

    pub fn score_for_color_clear(&self) -> u32 {
        self.color_clear_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_score_grows_past_two() {
        let rules = ScoreRules::default();
        assert_eq!(rules.score_for_match(2), 0);
        assert_eq!(rules.score_for_match(3), 60);
        assert_eq!(rules.score_for_match(8), 360);
    }

    #[test]
    fn chain_bonus_starts_at_depth_two() {
        let rules = ScoreRules::default();
        assert_eq!(rules.score_for_pass(3, 1), 60);
        assert_eq!(rules.score_for_pass(3, 2), 1060);
        assert_eq!(rules.score_for_pass(4, 5), 1120);
    }

    #[test]
    fn custom_rules_are_respected() {
        let rules = ScoreRules {
            match_base_score: 10,
            chain_bonus: 5,
            color_clear_bonus: 7,
        };
        assert_eq!(rules.score_for_pass(5, 2), 35);
        assert_eq!(rules.score_for_color_clear(), 7);
    }
}
