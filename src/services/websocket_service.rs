use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    dto::{
        matches::CommandResponse,
        ws::{ClickerAck, ClickerFeedback, ClickerInboundMessage},
    },
    services::match_service,
    state::{ClickerConnection, SharedState, game::Side},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum ClickerError {
    /// Writer channel closed; the connection should be terminated.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Scoreboard command a clicker can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickerCommand {
    /// Credit a point.
    Point(Side),
    /// Take back the previous point of this side.
    Correct(Side),
    /// Take back the last point.
    Undo,
    /// Players change ends.
    Swap,
    /// Zero the current set.
    ResetSet,
}

/// Map a raw key from keyboard-emulating remotes.
pub fn key_command(key: &str) -> Option<ClickerCommand> {
    match key {
        "1" => Some(ClickerCommand::Point(Side::Player1)),
        "2" => Some(ClickerCommand::Point(Side::Player2)),
        "r" | "R" => Some(ClickerCommand::ResetSet),
        "z" | "Z" => Some(ClickerCommand::Undo),
        "s" | "S" => Some(ClickerCommand::Swap),
        _ => None,
    }
}

fn command_for(message: &ClickerInboundMessage) -> Option<ClickerCommand> {
    match message {
        ClickerInboundMessage::Point { side } => Some(ClickerCommand::Point(*side)),
        ClickerInboundMessage::Undo => Some(ClickerCommand::Undo),
        ClickerInboundMessage::Swap => Some(ClickerCommand::Swap),
        ClickerInboundMessage::ResetSet => Some(ClickerCommand::ResetSet),
        ClickerInboundMessage::Key { key } => key_command(key),
        ClickerInboundMessage::Identification { .. } | ClickerInboundMessage::Unknown => None,
    }
}

/// Turns a quick second tap for the same side into a correction of the first one.
#[derive(Debug)]
pub struct TapFilter {
    window: Duration,
    last: Option<(Side, Instant)>,
}

impl TapFilter {
    /// Filter treating taps closer than `window` as corrections.
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Decide what a point tap for `side` at `now` should do. A correction consumes the
    /// pending tap.
    pub fn classify(&mut self, side: Side, now: Instant) -> ClickerCommand {
        match self.last.take() {
            Some((previous, at)) if previous == side && now.duration_since(at) < self.window => {
                ClickerCommand::Correct(side)
            }
            _ => ClickerCommand::Point(side),
        }
    }

    /// Remember a point that was actually credited.
    pub fn record(&mut self, side: Side, now: Instant) {
        self.last = Some((side, now));
    }

    /// Forget the pending tap, e.g. after another command went through.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Handle the full lifecycle of an individual clicker WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let clicker_id = match ClickerInboundMessage::from_json_str(&initial_message) {
        Ok(ClickerInboundMessage::Identification { id }) => id,
        Ok(_) => {
            warn!("first message was not identification");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(error = %err, "failed to parse or validate clicker message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let connection = ClickerConnection {
        id: clicker_id.clone(),
        tx: outbound_tx.clone(),
    };
    if let Some(previous) = state.clickers().insert(clicker_id.clone(), connection) {
        info!(id = %previous.id, "replacing an older connection for this clicker");
        let _ = previous.tx.send(Message::Close(None));
    }
    info!(id = %clicker_id, "clicker connected");

    let ack = ClickerAck {
        id: clicker_id.clone(),
        status: "connected".into(),
    };
    if send_message_to_websocket(&outbound_tx, &ack).is_err() {
        disconnect(&state, &clicker_id, &outbound_tx);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let mut taps = TapFilter::new(state.config().input.double_tap_delay);

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(id = %clicker_id, payload = %text, "received clicker message");

                let parsed = match ClickerInboundMessage::from_json_str(&text) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        warn!(id = %clicker_id, error = %err, "failed to parse or validate clicker message");
                        continue;
                    }
                };
                let Some(command) = command_for(&parsed) else {
                    debug!(id = %clicker_id, message = ?parsed, "ignoring clicker message");
                    continue;
                };

                let tapped_at = Instant::now();
                let command = match command {
                    ClickerCommand::Point(side) => taps.classify(side, tapped_at),
                    other => {
                        taps.clear();
                        other
                    }
                };

                let response = execute(&state, command).await;
                if let ClickerCommand::Point(side) = command
                    && response.applied
                {
                    taps.record(side, tapped_at);
                }
                if send_message_to_websocket(&outbound_tx, &feedback(&response)).is_err() {
                    info!(id = %clicker_id, "connection closed while sending feedback, terminating");
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %clicker_id, "clicker closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %clicker_id, error = %err, "websocket error");
                break;
            }
        }
    }

    disconnect(&state, &clicker_id, &outbound_tx);
    info!(id = %clicker_id, "clicker disconnected");

    finalize(writer_task, outbound_tx).await;
}

async fn execute(state: &SharedState, command: ClickerCommand) -> CommandResponse {
    match command {
        ClickerCommand::Point(side) => match_service::score_point(state, side).await,
        ClickerCommand::Correct(side) => match_service::correct_point(state, side).await,
        ClickerCommand::Undo => match_service::undo(state).await,
        ClickerCommand::Swap => match_service::swap_courts(state).await,
        ClickerCommand::ResetSet => match_service::reset_set(state).await,
    }
}

fn feedback(response: &CommandResponse) -> ClickerFeedback {
    let serve = response
        .scoreboard
        .current
        .as_ref()
        .map(|current| (current.serve.server, current.serve.side));
    ClickerFeedback {
        applied: response.applied,
        server: serve.map(|(server, _)| server),
        serve_side: serve.map(|(_, side)| side),
    }
}

/// Drop the registry entry unless a newer connection already replaced it.
fn disconnect(state: &SharedState, clicker_id: &str, tx: &mpsc::UnboundedSender<Message>) {
    state
        .clickers()
        .remove_if(clicker_id, |_, connection| connection.tx.same_channel(tx));
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is reported.
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), ClickerError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| ClickerError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(key_command("1"), Some(ClickerCommand::Point(Side::Player1)));
        assert_eq!(key_command("2"), Some(ClickerCommand::Point(Side::Player2)));
        assert_eq!(key_command("R"), Some(ClickerCommand::ResetSet));
        assert_eq!(key_command("z"), Some(ClickerCommand::Undo));
        assert_eq!(key_command("S"), Some(ClickerCommand::Swap));
        assert_eq!(key_command("3"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_second_tap_corrects_the_same_side() {
        let mut taps = TapFilter::new(Duration::from_millis(300));
        let start = Instant::now();

        assert_eq!(
            taps.classify(Side::Player1, start),
            ClickerCommand::Point(Side::Player1)
        );
        taps.record(Side::Player1, start);
        assert_eq!(
            taps.classify(Side::Player1, start + Duration::from_millis(120)),
            ClickerCommand::Correct(Side::Player1)
        );
        // The correction consumed the pending tap, so the next one scores again.
        assert_eq!(
            taps.classify(Side::Player1, start + Duration::from_millis(200)),
            ClickerCommand::Point(Side::Player1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_taps_do_not_arm_a_correction() {
        let mut taps = TapFilter::new(Duration::from_millis(300));
        let start = Instant::now();

        // First tap was not credited (e.g. during the pause between sets).
        taps.classify(Side::Player2, start);
        assert_eq!(
            taps.classify(Side::Player2, start + Duration::from_millis(100)),
            ClickerCommand::Point(Side::Player2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_or_opposite_taps_score() {
        let mut taps = TapFilter::new(Duration::from_millis(300));
        let start = Instant::now();

        taps.record(Side::Player1, start);
        assert_eq!(
            taps.classify(Side::Player2, start + Duration::from_millis(50)),
            ClickerCommand::Point(Side::Player2)
        );
        taps.record(Side::Player2, start + Duration::from_millis(50));
        assert_eq!(
            taps.classify(Side::Player2, start + Duration::from_millis(400)),
            ClickerCommand::Point(Side::Player2)
        );

        taps.record(Side::Player2, start + Duration::from_millis(400));
        taps.clear();
        assert_eq!(
            taps.classify(Side::Player2, start + Duration::from_millis(450)),
            ClickerCommand::Point(Side::Player2)
        );
    }
}
