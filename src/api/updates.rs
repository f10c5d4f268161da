//! `WebSocket` live-update endpoint.
//!
//! Each socket registers an outbound channel with the live registry under its
//! client id. Broadcasts and personal replies arrive on that channel and are
//! forwarded to the socket by the loop below.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::AppState;
use crate::services::LiveUpdates;

/// `GET /api/updates/{client_id}` (upgrade)
pub async fn updates_ws(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let live = state.shared.live.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, live, client_id))
}

async fn handle_socket(mut socket: WebSocket, live: LiveUpdates, client_id: String) {
    let (sink, mut outbound) = LiveUpdates::channel();
    live.connect(&client_id, sink.clone()).await;
    info!(client_id = %client_id, "Live update client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = format!("Message received: {}", text.as_str());
                        live.send_personal(&client_id, &reply).await;
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = socket.send(Message::Text(frame.into())).await {
                    debug!(client_id = %client_id, error = %e, "Live update socket send failed");
                    break;
                }
            }
        }
    }

    live.disconnect_sink(&client_id, &sink).await;
    info!(client_id = %client_id, "Live update client disconnected");
}
