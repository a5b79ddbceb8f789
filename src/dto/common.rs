use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    controller::{MatchDetails, MatchView},
    game::{MatchType, Side, Sport},
    serve::ServeSide,
    set_tracker::SetState,
    state_machine::MatchPhase,
};

/// One scoreboard slot as shown on the display.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Player or team name.
    pub name: String,
    /// Points in the current set.
    pub score: u32,
    /// Sets won so far.
    pub sets_won: u32,
}

/// Who serves and from where.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ServeSnapshot {
    /// Slot serving next.
    pub server: Side,
    /// Court half the server serves from.
    pub side: ServeSide,
    /// Serves left before the turn passes (doubles rotation).
    pub rotation_counter: u8,
    /// Points played since the match started.
    pub total_points_played: u32,
}

/// State of the running (or just finished) match.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct MatchSnapshot {
    /// Identifier shared by the history entries of this match.
    pub match_id: Uuid,
    /// Sport deciding the serve rules.
    pub sport: Sport,
    /// Singles or doubles.
    pub match_type: MatchType,
    /// Points needed to win a set.
    pub win_score: u32,
    /// Best-of count.
    pub total_sets: u32,
    /// 1-based number of the set being played.
    pub set_number: u32,
    /// First slot on the scoreboard.
    pub player1: PlayerSlot,
    /// Second slot on the scoreboard.
    pub player2: PlayerSlot,
    /// Serve indicator.
    pub serve: ServeSnapshot,
    /// Final scores of the sets already played, in display order.
    pub completed_sets: Vec<SetState>,
    /// True while players stand on the opposite ends from the start.
    pub court_swapped: bool,
    /// Points that can still be undone in the current match.
    pub points_logged: usize,
    /// Set once the match is decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
}

/// Full scoreboard pushed to displays after every committed change.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ScoreboardSnapshot {
    /// Where the match flow currently is.
    pub phase: MatchPhase,
    /// State-machine version the snapshot was taken at.
    pub version: usize,
    /// True when match history cannot be written.
    pub degraded: bool,
    /// Absent while idle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<MatchSnapshot>,
}

impl ScoreboardSnapshot {
    /// Combine the controller view with the degraded flag.
    pub fn new(view: MatchView, degraded: bool) -> Self {
        Self {
            phase: view.phase,
            version: view.version,
            degraded,
            current: view.current.map(MatchSnapshot::from),
        }
    }
}

impl From<MatchDetails> for MatchSnapshot {
    fn from(details: MatchDetails) -> Self {
        Self {
            match_id: details.match_id,
            sport: details.sport,
            match_type: details.match_type,
            win_score: details.win_score,
            total_sets: details.total_sets,
            set_number: details.set.set_number,
            player1: PlayerSlot {
                name: details.player1_name,
                score: details.set.score1,
                sets_won: details.sets_won1,
            },
            player2: PlayerSlot {
                name: details.player2_name,
                score: details.set.score2,
                sets_won: details.sets_won2,
            },
            serve: ServeSnapshot {
                server: details.server,
                side: details.serve_side,
                rotation_counter: details.rotation_counter,
                total_points_played: details.total_points_played,
            },
            completed_sets: details.completed_sets,
            court_swapped: details.court_swapped,
            points_logged: details.points_logged,
            winner: details.winner,
        }
    }
}
