//! Requests the controller hands back to the service layer once a command has committed.

use uuid::Uuid;

use crate::state::{
    game::{Side, Sport},
    serve::ServeSide,
    state_machine::MatchPhase,
};

/// Something worth saying out loud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A match just started.
    MatchStart,
    /// Score after a point.
    Score { score1: u32, score2: u32 },
    /// The current server serves again, from `side`.
    NextServeSamePlayer { side: ServeSide },
    /// The serve passed to `player`, serving from `side`.
    ServeChanged {
        player: Side,
        name: String,
        side: ServeSide,
    },
    /// `player` won the set.
    SetWin { player: Side, name: String },
    /// Set `set_number` begins.
    SetStart { set_number: u32 },
    /// The match is over.
    MatchEnd { winner: Side, name: String },
    /// The current set was zeroed.
    Reset,
    /// A point was taken back.
    Undo,
    /// Players changed ends.
    CourtSwap,
}

/// Final score of a completed set, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRecord {
    /// Match the set belongs to.
    pub match_id: Uuid,
    /// Sport the set was played in.
    pub sport: Sport,
    /// 1-based set number.
    pub set_number: u32,
    /// First slot name.
    pub player1_name: String,
    /// First slot score.
    pub score1: u32,
    /// Second slot name.
    pub player2_name: String,
    /// Second slot score.
    pub score2: u32,
}

/// Proof that a delayed transition was scheduled against a specific state-machine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTicket {
    /// Match the transition belongs to.
    pub match_id: Uuid,
    /// Version the transition was scheduled at.
    pub version: usize,
}

/// Final result shown once the match is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    /// Finished match.
    pub match_id: Uuid,
    /// Winning slot.
    pub winner: Side,
    /// Name of the winner.
    pub winner_name: String,
    /// Sets won by the first slot.
    pub sets_won1: u32,
    /// Sets won by the second slot.
    pub sets_won2: u32,
}

/// Side-effect requests emitted after the authoritative state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutput {
    /// Speak an announcement.
    Announce(Announcement),
    /// Push a fresh snapshot to the display.
    Refresh,
    /// Store a completed set.
    RecordSet(SetRecord),
    /// Start recording the match.
    StartRecording { match_id: Uuid, sport: Sport },
    /// Stop recording the match.
    StopRecording { match_id: Uuid },
    /// Start the next set after the inter-set pause.
    ScheduleNextSet(TransitionTicket),
    /// Show the final result after the end-of-match pause.
    ScheduleSummary(MatchSummary),
}

/// Why a command left the match untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// Scoring commands are only accepted while a set is being played.
    NotInGame(MatchPhase),
    /// The log is empty or its tail belongs to a finished set.
    NothingToUndo,
    /// A correction named one side but the last point went to the given one.
    LastPointElsewhere(Side),
    /// A delayed transition fired after the match moved on.
    StaleTicket,
}

/// Result of a scoring command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command changed the match.
    Applied(Vec<MatchOutput>),
    /// The command was ignored.
    Ignored(IgnoredReason),
}

impl CommandOutcome {
    /// Whether the command changed the match.
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }

    /// Outputs to dispatch; empty when the command was ignored.
    pub fn into_outputs(self) -> Vec<MatchOutput> {
        match self {
            CommandOutcome::Applied(outputs) => outputs,
            CommandOutcome::Ignored(_) => Vec::new(),
        }
    }
}
