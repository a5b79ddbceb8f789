use crate::state::{game::Side, set_tracker::SetState};

/// Set-level standings for the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    /// Sets won by the first slot.
    pub sets_won1: u32,
    /// Sets won by the second slot.
    pub sets_won2: u32,
    /// Completed sets in play order.
    pub sets: Vec<SetState>,
    /// 1-based number of the set being played.
    pub current_set_number: u32,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            sets_won1: 0,
            sets_won2: 0,
            sets: Vec::new(),
            current_set_number: 1,
        }
    }
}

impl MatchState {
    /// Standings before the first set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets won by `side`.
    pub fn sets_won(&self, side: Side) -> u32 {
        match side {
            Side::Player1 => self.sets_won1,
            Side::Player2 => self.sets_won2,
        }
    }

    /// Credit `winner` with the set and archive its final score.
    pub fn apply_set_win(&mut self, winner: Side, completed: SetState) {
        match winner {
            Side::Player1 => self.sets_won1 += 1,
            Side::Player2 => self.sets_won2 += 1,
        }
        self.sets.push(completed);
    }

    /// Winner of the match once a side holds a majority of `total_sets`.
    pub fn check_match_end(&self, total_sets: u32) -> Option<Side> {
        let needed = total_sets.div_ceil(2);
        if self.sets_won1 >= needed {
            Some(Side::Player1)
        } else if self.sets_won2 >= needed {
            Some(Side::Player2)
        } else {
            None
        }
    }

    /// Record that play moved on to the next set.
    pub fn advance_set(&mut self) {
        self.current_set_number += 1;
    }

    /// Exchange the standings of both slots after a court swap.
    pub fn swap_sides(&mut self) {
        std::mem::swap(&mut self.sets_won1, &mut self.sets_won2);
        for set in &mut self.sets {
            set.swap_sides();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(set_number: u32, score1: u32, score2: u32) -> SetState {
        SetState {
            set_number,
            score1,
            score2,
        }
    }

    #[test]
    fn one_set_is_not_enough_in_best_of_three() {
        let mut state = MatchState::new();
        state.apply_set_win(Side::Player1, finished(1, 11, 0));
        assert_eq!(state.sets_won1, 1);
        assert_eq!(state.check_match_end(3), None);
        assert_eq!(state.sets.len(), 1);
    }

    #[test]
    fn majority_ends_the_match() {
        let mut state = MatchState::new();
        state.apply_set_win(Side::Player2, finished(1, 8, 11));
        state.apply_set_win(Side::Player1, finished(2, 11, 9));
        assert_eq!(state.check_match_end(3), None);
        state.apply_set_win(Side::Player2, finished(3, 10, 12));
        assert_eq!(state.check_match_end(3), Some(Side::Player2));
        assert!(state.sets.len() as u32 <= 3);
    }

    #[test]
    fn match_end_never_reports_a_tie() {
        for total_sets in [1u32, 3, 5, 7] {
            let mut state = MatchState::new();
            let mut winner = Side::Player1;
            loop {
                if let Some(side) = state.check_match_end(total_sets) {
                    assert_ne!(state.sets_won1, state.sets_won2);
                    assert_eq!(state.sets_won(side), total_sets.div_ceil(2));
                    break;
                }
                state.apply_set_win(winner, finished(state.current_set_number, 0, 0));
                state.advance_set();
                winner = winner.other();
            }
            assert!(state.sets.len() as u32 <= total_sets);
        }
    }

    #[test]
    fn swap_moves_set_counts_and_history() {
        let mut state = MatchState::new();
        state.apply_set_win(Side::Player1, finished(1, 11, 4));
        state.swap_sides();
        assert_eq!((state.sets_won1, state.sets_won2), (0, 1));
        assert_eq!(state.sets[0], finished(1, 4, 11));
    }
}
