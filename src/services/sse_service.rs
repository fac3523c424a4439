use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{SharedState, SseHub},
};

const EVENT_INFO: &str = "info";

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    stream_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(stream = stream_name, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }
        info!(stream = stream_name, "SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Announce a new subscription on the stream with an `info` event.
pub fn broadcast_handshake(hub: &SseHub, stream: &str, degraded: bool) {
    let handshake = Handshake {
        stream: stream.to_string(),
        message: format!("{stream} stream connected"),
        degraded,
    };
    match ServerEvent::json(Some(EVENT_INFO.to_string()), &handshake) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialize SSE handshake"),
    }
}

/// Send a human-readable info message onto the public SSE stream.
pub fn broadcast_public_info(hub: &SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some(EVENT_INFO.to_string()),
        message.to_string(),
    ));
}
