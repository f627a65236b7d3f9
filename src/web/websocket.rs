//! Listener presence WebSocket
//!
//! Each connection runs a reader loop feeding the presence broadcaster and a
//! writer task draining the connection's outbound queue into the socket.
//! Whichever side ends first ends the session.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::presence::Presence;
use crate::web::server::AppState;

/// Handles WebSocket upgrade requests to `/ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let presence = state.presence.clone();
    ws.on_upgrade(move |socket| listener_session(socket, addr, presence))
}

/// Manages a single listener connection
async fn listener_session(socket: WebSocket, addr: SocketAddr, presence: Arc<Presence>) {
    let (mut sink, mut stream) = socket.split();
    let (session, mut outbound) = presence.connect(addr);

    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if presence.handle_text(&session, &text).is_none() {
                        tracing::debug!(
                            "Ignoring message from listener {} ({}): {:?}",
                            session.id(),
                            session.addr(),
                            text
                        );
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Listener {} socket error: {}", session.id(), e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    presence.disconnect(&session);
    writer.abort();
}
