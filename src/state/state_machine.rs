use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// High-level phases a match can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// No match is running; a new one can be configured.
    Idle,
    /// Points are being played in the current set.
    InGame,
    /// A set has just finished and the next one has not started yet.
    SetEnded,
    /// The match has a winner; only returning to idle is possible.
    MatchEnded,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// A validated configuration starts a match.
    StartMatch,
    /// The current set produced a winner.
    SetWon,
    /// The set winner also clinched the match.
    MatchWon,
    /// The pause between sets elapsed.
    NextSet,
    /// Leave the match, finished or not.
    ReturnToIdle,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Phase at the time of the snapshot.
    pub phase: MatchPhase,
    /// Increments on each transition.
    pub version: usize,
}

/// Phase tracker for one scoreboard.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    phase: MatchPhase,
    version: usize,
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self {
            phase: MatchPhase::Idle,
            version: 0,
        }
    }
}

impl MatchStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Phase and version captured together.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (MatchPhase::Idle, MatchEvent::StartMatch) => MatchPhase::InGame,
            (MatchPhase::InGame, MatchEvent::SetWon) => MatchPhase::SetEnded,
            (MatchPhase::SetEnded, MatchEvent::MatchWon) => MatchPhase::MatchEnded,
            (MatchPhase::SetEnded, MatchEvent::NextSet) => MatchPhase::InGame,
            (
                MatchPhase::InGame | MatchPhase::SetEnded | MatchPhase::MatchEnded,
                MatchEvent::ReturnToIdle,
            ) => MatchPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_idle() {
        let sm = MatchStateMachine::new();
        assert_eq!(sm.phase(), MatchPhase::Idle);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn full_happy_path_through_match() {
        let mut sm = MatchStateMachine::new();

        assert_eq!(sm.apply(MatchEvent::StartMatch).unwrap(), MatchPhase::InGame);
        assert_eq!(sm.apply(MatchEvent::SetWon).unwrap(), MatchPhase::SetEnded);
        assert_eq!(sm.apply(MatchEvent::NextSet).unwrap(), MatchPhase::InGame);
        assert_eq!(sm.apply(MatchEvent::SetWon).unwrap(), MatchPhase::SetEnded);
        assert_eq!(sm.apply(MatchEvent::MatchWon).unwrap(), MatchPhase::MatchEnded);
        assert_eq!(sm.apply(MatchEvent::ReturnToIdle).unwrap(), MatchPhase::Idle);
        assert_eq!(sm.version(), 6);
    }

    #[test]
    fn match_end_is_terminal_until_idle() {
        let mut sm = MatchStateMachine::new();
        sm.apply(MatchEvent::StartMatch).unwrap();
        sm.apply(MatchEvent::SetWon).unwrap();
        sm.apply(MatchEvent::MatchWon).unwrap();

        let err = sm.apply(MatchEvent::NextSet).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: MatchPhase::MatchEnded,
                event: MatchEvent::NextSet,
            }
        );
        assert_eq!(sm.phase(), MatchPhase::MatchEnded);
    }

    #[test]
    fn invalid_transition_leaves_version_untouched() {
        let mut sm = MatchStateMachine::new();
        let err = sm.apply(MatchEvent::SetWon).unwrap_err();
        assert_eq!(err.from, MatchPhase::Idle);
        assert_eq!(sm.version(), 0);
        assert!(sm.apply(MatchEvent::ReturnToIdle).is_err());
    }

    #[test]
    fn abandoning_mid_match_returns_to_idle() {
        let mut sm = MatchStateMachine::new();
        sm.apply(MatchEvent::StartMatch).unwrap();
        assert_eq!(sm.apply(MatchEvent::ReturnToIdle).unwrap(), MatchPhase::Idle);
        assert_eq!(sm.snapshot().version, 2);
    }
}
