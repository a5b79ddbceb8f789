//! Composition root of the scoring core. Every command runs to completion against the owned
//! match state and returns the side-effect requests the caller must dispatch afterwards.

use tracing::debug;
use uuid::Uuid;

use crate::state::{
    event_log::{PointEvent, ScoreEventLog},
    game::{MatchConfig, MatchType, Side, Sport},
    match_tracker::MatchState,
    output::{
        Announcement, CommandOutcome, IgnoredReason, MatchOutput, MatchSummary, SetRecord,
        TransitionTicket,
    },
    serve::{self, RotationSignal, ServeSide, ServeState},
    set_tracker::SetState,
    state_machine::{InvalidTransition, MatchEvent, MatchPhase, MatchStateMachine},
};

/// Everything owned for the lifetime of one match.
#[derive(Debug, Clone)]
struct MatchSession {
    id: Uuid,
    config: MatchConfig,
    serve: ServeState,
    set: SetState,
    standings: MatchState,
    log: ScoreEventLog,
    court_swapped: bool,
    winner: Option<Side>,
}

impl MatchSession {
    fn new(config: MatchConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            serve: ServeState::initial(),
            set: SetState::first(),
            standings: MatchState::new(),
            log: ScoreEventLog::new(),
            court_swapped: false,
            winner: None,
        }
    }

    /// Name of whoever currently stands in `side`.
    fn display_name(&self, side: Side) -> &str {
        let side = if self.court_swapped { side.other() } else { side };
        self.config.players().get(side)
    }

    fn serve_side(&self) -> ServeSide {
        serve::determine_serve_side(self.set.score(self.serve.current_server))
    }

    fn set_record(&self, completed: SetState) -> SetRecord {
        SetRecord {
            match_id: self.id,
            sport: self.config.sport(),
            set_number: completed.set_number,
            player1_name: self.display_name(Side::Player1).to_string(),
            score1: completed.score1,
            player2_name: self.display_name(Side::Player2).to_string(),
            score2: completed.score2,
        }
    }
}

/// Read-only projection of the controller for displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchView {
    /// Current match phase.
    pub phase: MatchPhase,
    /// State-machine version, bumped on every transition.
    pub version: usize,
    /// Absent while idle.
    pub current: Option<MatchDetails>,
}

/// Details of the match in progress (or just finished).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDetails {
    /// Identifier of the match.
    pub match_id: Uuid,
    /// Sport being played.
    pub sport: Sport,
    /// Singles or doubles.
    pub match_type: MatchType,
    /// Points needed to win a set.
    pub win_score: u32,
    /// Best-of count.
    pub total_sets: u32,
    /// Name in the first slot, following court swaps.
    pub player1_name: String,
    /// Name in the second slot, following court swaps.
    pub player2_name: String,
    /// Set being played, or the one just finished.
    pub set: SetState,
    /// Sets won by the first slot.
    pub sets_won1: u32,
    /// Sets won by the second slot.
    pub sets_won2: u32,
    /// Final scores of earlier sets.
    pub completed_sets: Vec<SetState>,
    /// Slot serving next.
    pub server: Side,
    /// Court half the server serves from.
    pub serve_side: ServeSide,
    /// Serves left before the turn passes.
    pub rotation_counter: u8,
    /// Points played since the match started.
    pub total_points_played: u32,
    /// Whether players changed ends an odd number of times.
    pub court_swapped: bool,
    /// Points that can still be undone.
    pub points_logged: usize,
    /// Set once the match is decided.
    pub winner: Option<Side>,
}

/// Single mutator for the scoreboard.
#[derive(Debug, Clone, Default)]
pub struct MatchController {
    machine: MatchStateMachine,
    session: Option<MatchSession>,
    reset_serve_each_set: bool,
}

impl MatchController {
    /// `reset_serve_each_set` restores the opening serve state at each new set instead of
    /// carrying the rotation over.
    pub fn new(reset_serve_each_set: bool) -> Self {
        Self {
            machine: MatchStateMachine::new(),
            session: None,
            reset_serve_each_set,
        }
    }

    /// Current match phase.
    pub fn phase(&self) -> MatchPhase {
        self.machine.phase()
    }

    /// Identifier of the current match, if any.
    pub fn match_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Start a match from idle with a fresh set of trackers.
    pub fn start_match(&mut self, config: MatchConfig) -> Result<Vec<MatchOutput>, InvalidTransition> {
        self.machine.apply(MatchEvent::StartMatch)?;

        let session = MatchSession::new(config);
        debug!(match_id = %session.id, sport = ?session.config.sport(), "match started");
        let outputs = vec![
            MatchOutput::StartRecording {
                match_id: session.id,
                sport: session.config.sport(),
            },
            MatchOutput::Announce(Announcement::MatchStart),
            MatchOutput::Refresh,
        ];
        self.session = Some(session);
        Ok(outputs)
    }

    /// Discard the current match, finished or abandoned.
    pub fn return_to_idle(&mut self) -> Result<Vec<MatchOutput>, InvalidTransition> {
        let was_running = matches!(
            self.machine.phase(),
            MatchPhase::InGame | MatchPhase::SetEnded
        );
        self.machine.apply(MatchEvent::ReturnToIdle)?;

        let mut outputs = Vec::new();
        if let Some(session) = self.session.take()
            && was_running
        {
            outputs.push(MatchOutput::StopRecording {
                match_id: session.id,
            });
        }
        outputs.push(MatchOutput::Refresh);
        Ok(outputs)
    }

    /// Credit one point to `side`: rotate serve, apply the score, run the end checks.
    pub fn score_point(&mut self, side: Side) -> CommandOutcome {
        let phase = self.machine.phase();
        let Some(session) = self.session.as_mut().filter(|_| phase == MatchPhase::InGame) else {
            return CommandOutcome::Ignored(IgnoredReason::NotInGame(phase));
        };

        let prior = session.serve;
        let (next_serve, signal) = serve::compute_rotation(
            session.config.sport(),
            session.config.match_type(),
            prior,
            side,
        );

        session.log.record(PointEvent {
            side,
            score_at_time: session.set.score(side),
            set_number: session.set.set_number,
            court_swapped: session.court_swapped,
            serve_before: prior,
        });
        session.set.apply_point(side);
        session.serve = next_serve;

        let mut outputs = vec![MatchOutput::Announce(Announcement::Score {
            score1: session.set.score1,
            score2: session.set.score2,
        })];

        match session.set.check_set_end(session.config.win_score()) {
            Some(set_winner) => {
                let completed = session.set;
                session.standings.apply_set_win(set_winner, completed);
                outputs.push(MatchOutput::RecordSet(session.set_record(completed)));
                outputs.push(MatchOutput::Announce(Announcement::SetWin {
                    player: set_winner,
                    name: session.display_name(set_winner).to_string(),
                }));
                debug!(
                    match_id = %session.id,
                    set = completed.set_number,
                    winner = ?set_winner,
                    "set finished"
                );

                let match_winner = session
                    .standings
                    .check_match_end(session.config.total_sets());
                self.advance(MatchEvent::SetWon);

                match match_winner {
                    Some(winner) => {
                        self.advance(MatchEvent::MatchWon);
                        outputs.extend(self.finish_match(winner));
                    }
                    None => outputs.push(MatchOutput::ScheduleNextSet(TransitionTicket {
                        match_id: self.match_id_or_nil(),
                        version: self.machine.version(),
                    })),
                }
            }
            None => match signal {
                RotationSignal::None => {}
                RotationSignal::NextServeSameSide => {
                    outputs.push(MatchOutput::Announce(Announcement::NextServeSamePlayer {
                        side: session.serve_side(),
                    }));
                }
                RotationSignal::ServeChanged => {
                    let server = session.serve.current_server;
                    outputs.push(MatchOutput::Announce(Announcement::ServeChanged {
                        player: server,
                        name: session.display_name(server).to_string(),
                        side: session.serve_side(),
                    }));
                }
            },
        }

        outputs.push(MatchOutput::Refresh);
        CommandOutcome::Applied(outputs)
    }

    /// Take back the most recent point of the current set.
    pub fn undo(&mut self) -> CommandOutcome {
        self.take_back(None)
    }

    /// Take back the most recent point only if it went to `side` as the scoreboard shows it
    /// now. Used to correct an accidental second tap.
    pub fn correct_point(&mut self, side: Side) -> CommandOutcome {
        self.take_back(Some(side))
    }

    fn take_back(&mut self, expected: Option<Side>) -> CommandOutcome {
        let phase = self.machine.phase();
        let Some(session) = self.session.as_mut().filter(|_| phase == MatchPhase::InGame) else {
            return CommandOutcome::Ignored(IgnoredReason::NotInGame(phase));
        };

        let current_set = session.set.set_number;
        let Some(last) = session
            .log
            .last()
            .filter(|event| event.set_number == current_set)
        else {
            return CommandOutcome::Ignored(IgnoredReason::NothingToUndo);
        };

        // A court swap since the point moved its player to the other slot.
        let flipped = last.court_swapped != session.court_swapped;
        let side = if flipped { last.side.other() } else { last.side };
        if let Some(expected) = expected
            && expected != side
        {
            return CommandOutcome::Ignored(IgnoredReason::LastPointElsewhere(side));
        }
        let mut restored = last.serve_before;
        if flipped {
            restored.toggle_server();
        }

        session.log.undo_last();
        session.set.remove_point(side);
        session.serve = restored;

        CommandOutcome::Applied(vec![
            MatchOutput::Announce(Announcement::Undo),
            MatchOutput::Refresh,
        ])
    }

    /// Players change ends: scores, set counts and the server follow them.
    pub fn swap_courts(&mut self) -> CommandOutcome {
        let phase = self.machine.phase();
        let Some(session) = self.session.as_mut().filter(|_| phase == MatchPhase::InGame) else {
            return CommandOutcome::Ignored(IgnoredReason::NotInGame(phase));
        };

        session.set.swap_sides();
        session.standings.swap_sides();
        session.serve.toggle_server();
        session.court_swapped = !session.court_swapped;

        CommandOutcome::Applied(vec![
            MatchOutput::Announce(Announcement::CourtSwap),
            MatchOutput::Refresh,
        ])
    }

    /// Zero the current set and drop its points from the log. Serve state is kept.
    pub fn reset_set(&mut self) -> CommandOutcome {
        let phase = self.machine.phase();
        let Some(session) = self.session.as_mut().filter(|_| phase == MatchPhase::InGame) else {
            return CommandOutcome::Ignored(IgnoredReason::NotInGame(phase));
        };

        session.set.reset_scores();
        let discarded = session.log.discard_set(session.set.set_number);
        debug!(match_id = %session.id, discarded, "set reset");

        CommandOutcome::Applied(vec![
            MatchOutput::Announce(Announcement::Reset),
            MatchOutput::Refresh,
        ])
    }

    /// Leave the between-sets pause. Tickets from an older version are ignored.
    pub fn begin_next_set(&mut self, ticket: TransitionTicket) -> CommandOutcome {
        let current = self.machine.snapshot();
        let reset_serve = self.reset_serve_each_set;
        let Some(session) = self.session.as_mut().filter(|session| {
            current.phase == MatchPhase::SetEnded
                && session.id == ticket.match_id
                && current.version == ticket.version
        }) else {
            return CommandOutcome::Ignored(IgnoredReason::StaleTicket);
        };

        session.set.reset_for_next_set();
        session.standings.advance_set();
        if reset_serve {
            session.serve = ServeState::initial();
        }
        let set_number = session.set.set_number;
        self.advance(MatchEvent::NextSet);

        CommandOutcome::Applied(vec![
            MatchOutput::Announce(Announcement::SetStart { set_number }),
            MatchOutput::Refresh,
        ])
    }

    /// Read-only projection for displays.
    pub fn view(&self) -> MatchView {
        let snapshot = self.machine.snapshot();
        MatchView {
            phase: snapshot.phase,
            version: snapshot.version,
            current: self.session.as_ref().map(|session| MatchDetails {
                match_id: session.id,
                sport: session.config.sport(),
                match_type: session.config.match_type(),
                win_score: session.config.win_score(),
                total_sets: session.config.total_sets(),
                player1_name: session.display_name(Side::Player1).to_string(),
                player2_name: session.display_name(Side::Player2).to_string(),
                set: session.set,
                sets_won1: session.standings.sets_won1,
                sets_won2: session.standings.sets_won2,
                completed_sets: session.standings.sets.clone(),
                server: session.serve.current_server,
                serve_side: session.serve_side(),
                rotation_counter: session.serve.rotation_counter,
                total_points_played: session.serve.total_points_played,
                court_swapped: session.court_swapped,
                points_logged: session.log.len(),
                winner: session.winner,
            }),
        }
    }

    fn finish_match(&mut self, winner: Side) -> Vec<MatchOutput> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.winner = Some(winner);
        let name = session.display_name(winner).to_string();
        debug!(match_id = %session.id, winner = ?winner, "match finished");

        vec![
            MatchOutput::Announce(Announcement::MatchEnd {
                winner,
                name: name.clone(),
            }),
            MatchOutput::StopRecording {
                match_id: session.id,
            },
            MatchOutput::ScheduleSummary(MatchSummary {
                match_id: session.id,
                winner,
                winner_name: name,
                sets_won1: session.standings.sets_won1,
                sets_won2: session.standings.sets_won2,
            }),
        ]
    }

    fn match_id_or_nil(&self) -> Uuid {
        self.match_id().unwrap_or_else(Uuid::nil)
    }

    /// Apply a transition the caller has already proven valid for the current phase.
    fn advance(&mut self, event: MatchEvent) {
        self.machine
            .apply(event)
            .expect("controller only applies transitions valid for the current phase");
    }
}
