//! Serve rotation rules. Pure functions of the sport, match type, prior serve state and the
//! side that just scored.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::game::{MatchType, Side, Sport};

/// Serves a player gets per turn under the two-serve rule.
const SERVES_PER_TURN: u8 = 2;

/// Half of the court the server serves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServeSide {
    /// Even server score.
    Right,
    /// Odd server score.
    Left,
}

/// What the rotation step wants narrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSignal {
    /// Nothing changed worth announcing.
    None,
    /// The same server serves again (second serve of the turn).
    NextServeSameSide,
    /// Serve passed to the other side.
    ServeChanged,
}

/// Serve bookkeeping carried through a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeState {
    /// Slot serving next.
    pub current_server: Side,
    /// Serves remaining before the rotation check (1 or 2).
    pub rotation_counter: u8,
    /// Points played since the match started.
    pub total_points_played: u32,
}

impl ServeState {
    /// Serve state at the start of a match: Player1 serves with a full turn ahead.
    pub fn initial() -> Self {
        Self {
            current_server: Side::Player1,
            rotation_counter: SERVES_PER_TURN,
            total_points_played: 0,
        }
    }

    /// Swap the server to the other slot, used when players change ends.
    pub fn toggle_server(&mut self) {
        self.current_server = self.current_server.other();
    }
}

impl Default for ServeState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Compute the serve state after `scoring_side` wins a point.
///
/// The returned state always counts the point in `total_points_played`.
pub fn compute_rotation(
    sport: Sport,
    match_type: MatchType,
    prior: ServeState,
    scoring_side: Side,
) -> (ServeState, RotationSignal) {
    let (mut next, signal) = match sport {
        Sport::Badminton | Sport::Pickleball if prior.total_points_played == 0 => {
            first_point(prior, scoring_side)
        }
        Sport::Badminton | Sport::Pickleball => match match_type {
            MatchType::Single => rally_point(prior, scoring_side),
            MatchType::Double => two_serve_turn(prior, scoring_side),
        },
        Sport::TableTennis => two_serve_turn(prior, scoring_side),
        Sport::Footvolley => rally_point(prior, scoring_side),
    };

    next.total_points_played = prior.total_points_played + 1;
    (next, signal)
}

/// Side to serve from, driven by the server's own score.
pub fn determine_serve_side(server_score: u32) -> ServeSide {
    if server_score % 2 == 0 {
        ServeSide::Right
    } else {
        ServeSide::Left
    }
}

fn first_point(prior: ServeState, scoring_side: Side) -> (ServeState, RotationSignal) {
    let signal = if scoring_side != Side::Player1 {
        RotationSignal::ServeChanged
    } else {
        RotationSignal::None
    };

    let next = ServeState {
        current_server: Side::Player1,
        rotation_counter: SERVES_PER_TURN,
        ..prior
    };
    (next, signal)
}

/// Serve always follows the point winner.
fn rally_point(prior: ServeState, scoring_side: Side) -> (ServeState, RotationSignal) {
    if scoring_side == prior.current_server {
        return (prior, RotationSignal::None);
    }

    let next = ServeState {
        current_server: scoring_side,
        ..prior
    };
    (next, RotationSignal::ServeChanged)
}

fn two_serve_turn(prior: ServeState, scoring_side: Side) -> (ServeState, RotationSignal) {
    if scoring_side == prior.current_server {
        return (prior, RotationSignal::None);
    }

    if prior.rotation_counter <= 1 {
        let next = ServeState {
            rotation_counter: SERVES_PER_TURN,
            ..prior
        };
        (next, RotationSignal::NextServeSameSide)
    } else {
        let next = ServeState {
            current_server: scoring_side,
            rotation_counter: 1,
            ..prior
        };
        (next, RotationSignal::ServeChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Side::{Player1 as A, Player2 as B};

    fn run(sport: Sport, match_type: MatchType, points: &[Side]) -> Vec<(Side, RotationSignal)> {
        let mut serve = ServeState::initial();
        points
            .iter()
            .map(|&side| {
                let (next, signal) = compute_rotation(sport, match_type, serve, side);
                serve = next;
                (serve.current_server, signal)
            })
            .collect()
    }

    #[test]
    fn badminton_first_point_forces_player_one() {
        let (next, signal) =
            compute_rotation(Sport::Badminton, MatchType::Double, ServeState::initial(), B);
        assert_eq!(next.current_server, A);
        assert_eq!(next.rotation_counter, 2);
        assert_eq!(next.total_points_played, 1);
        assert_eq!(signal, RotationSignal::ServeChanged);

        let (_, signal) =
            compute_rotation(Sport::Pickleball, MatchType::Single, ServeState::initial(), A);
        assert_eq!(signal, RotationSignal::None);
    }

    #[test]
    fn badminton_singles_server_follows_last_scorer() {
        let points = [A, B, B, A, B, A, A, B];
        let outcome = run(Sport::Badminton, MatchType::Single, &points);
        for (index, (&scorer, (server, _))) in points.iter().zip(&outcome).enumerate().skip(1) {
            assert_eq!(*server, scorer, "point {index}");
        }
        assert_eq!(outcome[1].1, RotationSignal::ServeChanged);
        assert_eq!(outcome[2].1, RotationSignal::None);
    }

    #[test]
    fn badminton_doubles_rotates_once_per_two_receiver_points() {
        // After the first serve change the counter sits at 1.
        let prior = ServeState {
            current_server: B,
            rotation_counter: 1,
            total_points_played: 5,
        };
        let (after_one, first) = compute_rotation(Sport::Badminton, MatchType::Double, prior, A);
        assert_eq!(first, RotationSignal::NextServeSameSide);
        assert_eq!(after_one.current_server, B);

        let (after_two, second) =
            compute_rotation(Sport::Badminton, MatchType::Double, after_one, A);
        assert_eq!(second, RotationSignal::ServeChanged);
        assert_eq!(after_two.current_server, A);
        assert_eq!(after_two.rotation_counter, 1);
    }

    #[test]
    fn server_points_do_not_advance_the_counter() {
        let prior = ServeState {
            current_server: A,
            rotation_counter: 1,
            total_points_played: 3,
        };
        let (next, signal) = compute_rotation(Sport::TableTennis, MatchType::Single, prior, A);
        assert_eq!(signal, RotationSignal::None);
        assert_eq!(next.rotation_counter, 1);
        assert_eq!(next.total_points_played, 4);
    }

    #[test]
    fn table_tennis_signal_sequence_is_the_same_for_singles_and_doubles() {
        let points = [A, A, B, B, A];
        let expected = vec![
            (A, RotationSignal::None),
            (A, RotationSignal::None),
            (B, RotationSignal::ServeChanged),
            (B, RotationSignal::None),
            (B, RotationSignal::NextServeSameSide),
        ];
        assert_eq!(run(Sport::TableTennis, MatchType::Single, &points), expected);
        assert_eq!(run(Sport::TableTennis, MatchType::Double, &points), expected);
    }

    #[test]
    fn footvolley_changes_serve_immediately() {
        let outcome = run(Sport::Footvolley, MatchType::Double, &[B, B, A, B]);
        assert_eq!(
            outcome,
            vec![
                (B, RotationSignal::ServeChanged),
                (B, RotationSignal::None),
                (A, RotationSignal::ServeChanged),
                (B, RotationSignal::ServeChanged),
            ]
        );
    }

    #[test]
    fn serve_side_tracks_parity_of_server_score() {
        assert_eq!(determine_serve_side(0), ServeSide::Right);
        assert_eq!(determine_serve_side(7), ServeSide::Left);
        assert_eq!(determine_serve_side(20), ServeSide::Right);
    }
}
