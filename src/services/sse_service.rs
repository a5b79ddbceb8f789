use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::match_service,
    state::SharedState,
};

/// Subscribe to the display stream and queue the greeting plus the current scoreboard.
///
/// The initial events go through the returned receiver's own queue so a freshly connected
/// display never misses the state it has to render first.
pub async fn subscribe_display(state: &SharedState) -> (Vec<ServerEvent>, broadcast::Receiver<ServerEvent>) {
    let receiver = state.display().subscribe();
    let mut initial = Vec::with_capacity(2);

    let handshake = Handshake {
        message: "display stream connected".into(),
        degraded: state.is_degraded(),
    };
    if let Ok(event) = ServerEvent::json(Some("handshake".to_string()), &handshake) {
        initial.push(event);
    }

    let snapshot = match_service::snapshot(state).await;
    if let Ok(event) = ServerEvent::json(Some("scoreboard".to_string()), &snapshot) {
        initial.push(event);
    }

    (initial, receiver)
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding events until the client
/// disconnects.
pub fn to_sse_stream(
    initial: Vec<ServerEvent>,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);

    tokio::spawn(async move {
        for payload in initial {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // The next scoreboard event carries the full state again.
                            debug!(skipped, "display stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("Display SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
