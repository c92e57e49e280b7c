//! WebSocket status stream.
//!
//! Each connection becomes one broadcaster subscriber: the socket's write
//! half (behind a `tokio::sync::Mutex`) is the [`StatusSink`], and the read
//! loop applies subscription messages. A client may hold one floor topic and
//! one lift topic at a time:
//!
//! ```json
//! { "type": "floor", "id": 3 }
//! { "type": "lift",  "id": "0b0f…-…" }
//! ```
//!
//! Unsubscribe is implicit on disconnect; a failed write tears the
//! subscriber down from the broadcaster side.

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::future::BoxFuture;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use futures::SinkExt;
use liftsim_runtime::{SinkError, StatusBroadcaster, StatusSink, StatusUpdate, SubscriberId};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Subscription message sent by clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SubscribeMessage {
    /// Follow one floor, by number.
    Floor {
        /// Floor number.
        id: u32,
    },
    /// Follow one lift, by id.
    Lift {
        /// Lift id.
        id: String,
    },
}

/// A subscriber sink over the socket's write half. The mutex serialises
/// writes, so updates never interleave on the wire.
struct WsStatusSink {
    writer: Mutex<SplitSink<WebSocket, Message>>,
}

impl StatusSink for WsStatusSink {
    fn send(&self, update: StatusUpdate) -> BoxFuture<'_, Result<(), SinkError>> {
        Box::pin(async move {
            let json =
                serde_json::to_string(&update).map_err(|e| SinkError::Write(e.to_string()))?;
            let mut writer = self.writer.lock().await;
            writer
                .send(Message::Text(json))
                .await
                .map_err(|e| SinkError::Write(e.to_string()))
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut writer = self.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
        })
    }
}

/// `GET /ws`: upgrade and attach to the status broadcaster.
pub async fn status_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<StatusBroadcaster>) {
    let (writer, reader) = socket.split();
    let sink = Arc::new(WsStatusSink {
        writer: Mutex::new(writer),
    });
    let subscriber = broadcaster.register(sink);
    info!(%subscriber, "status stream connected");

    read_subscriptions(reader, &broadcaster, subscriber).await;

    broadcaster.unregister(subscriber).await;
    info!(%subscriber, "status stream disconnected");
}

async fn read_subscriptions(
    mut reader: SplitStream<WebSocket>,
    broadcaster: &StatusBroadcaster,
    subscriber: SubscriberId,
) {
    while let Some(Ok(message)) = reader.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<SubscribeMessage>(&text) {
                Ok(SubscribeMessage::Floor { id }) => {
                    broadcaster.subscribe_floor(subscriber, id);
                    debug!(%subscriber, floor = id, "subscribed to floor topic");
                }
                Ok(SubscribeMessage::Lift { id }) => {
                    broadcaster.subscribe_lift(subscriber, &id);
                    debug!(%subscriber, lift = %id, "subscribed to lift topic");
                }
                Err(error) => {
                    warn!(%subscriber, %error, "ignoring malformed subscription message");
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of the
            // protocol.
            _ => {}
        }
    }
}
