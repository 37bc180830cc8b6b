//! WebSocket connection lifecycle.
//!
//! Each socket gets a `ConnectionId` and an outbound channel. A writer task
//! drains the channel into the socket while the reader loop hands parsed
//! events to the dispatcher one at a time.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::relay::dispatcher::RelayDispatcher;
use crate::relay::peers::{outbound_channel, ConnectionId};
use crate::relay::protocol::{ClientEvent, ServerEvent};

/// Drive one WebSocket until it closes.
pub async fn handle_socket(socket: WebSocket, dispatcher: Arc<RelayDispatcher>) {
    let id = ConnectionId::new();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = outbound_channel();

    tracing::info!(connection_id = %id, "New connection");
    dispatcher.connect(id, tx.clone());

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode server event");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    let _ = tx.try_send(ServerEvent::error(
                        "invalid_message",
                        "Binary frames must contain UTF-8 JSON",
                    ));
                    continue;
                }
            },
            // pongs are queued by the websocket layer
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "WebSocket error");
                break;
            }
        };

        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => dispatcher.handle(id, event),
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Unparsable event");
                let _ = tx.try_send(ServerEvent::error(
                    "parse_error",
                    format!("Invalid event: {}", e),
                ));
            }
        }
    }

    dispatcher.disconnect(id);
    drop(tx);
    // Remaining queued events are still flushed; the writer ends once every sender is gone.
    if let Err(e) = writer.await {
        tracing::debug!(connection_id = %id, error = %e, "Writer task ended abnormally");
    }
    tracing::info!(connection_id = %id, "Disconnected");
}
