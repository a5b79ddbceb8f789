use crate::state::{game::Side, serve::ServeState};

/// A single point as it was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointEvent {
    /// Slot credited with the point, in the court orientation active at the time.
    pub side: Side,
    /// Score of `side` before the point.
    pub score_at_time: u32,
    /// Set the point was scored in.
    pub set_number: u32,
    /// Court orientation when the point was recorded.
    pub court_swapped: bool,
    /// Serve state before the point, restored on undo.
    pub serve_before: ServeState,
}

/// Append-only log of scored points. Entries leave only from the tail.
#[derive(Debug, Clone, Default)]
pub struct ScoreEventLog {
    events: Vec<PointEvent>,
}

impl ScoreEventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scored point.
    pub fn record(&mut self, event: PointEvent) {
        self.events.push(event);
    }

    /// Remove and return the newest point.
    pub fn undo_last(&mut self) -> Option<PointEvent> {
        self.events.pop()
    }

    /// Newest point, if any.
    pub fn last(&self) -> Option<&PointEvent> {
        self.events.last()
    }

    /// Number of logged points.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no point is logged.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pop every trailing event that belongs to `set_number`, returning how many were removed.
    pub fn discard_set(&mut self, set_number: u32) -> usize {
        let mut removed = 0;
        while self
            .events
            .last()
            .is_some_and(|event| event.set_number == set_number)
        {
            self.events.pop();
            removed += 1;
        }
        removed
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &PointEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(side: Side, set_number: u32) -> PointEvent {
        PointEvent {
            side,
            score_at_time: 0,
            set_number,
            court_swapped: false,
            serve_before: ServeState::initial(),
        }
    }

    #[test]
    fn undo_pops_in_reverse_order() {
        let mut log = ScoreEventLog::new();
        log.record(event(Side::Player1, 1));
        log.record(event(Side::Player2, 1));
        assert_eq!(log.undo_last().map(|e| e.side), Some(Side::Player2));
        assert_eq!(log.undo_last().map(|e| e.side), Some(Side::Player1));
        assert_eq!(log.undo_last(), None);
        assert!(log.is_empty());
    }

    #[test]
    fn discard_set_only_touches_the_tail() {
        let mut log = ScoreEventLog::new();
        log.record(event(Side::Player1, 1));
        log.record(event(Side::Player1, 2));
        log.record(event(Side::Player2, 2));
        assert_eq!(log.discard_set(2), 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.discard_set(2), 0);
        assert_eq!(log.last().map(|e| e.set_number), Some(1));
    }
}
