use crate::server::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ParticipantId, ServerMessage};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ParticipantId::new();
    info!("New WebSocket connection: {connection_id}");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.registry.add(connection_id.clone(), tx.clone());

    // The client learns its own connection id (and the ICE servers to use)
    // from the first frame.
    let _ = tx.send(ServerMessage::Welcome {
        id: connection_id.clone(),
        ice_servers: state.ice_servers.clone(),
    });

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize server message: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let connection_id = connection_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            handle_client_message(&state, &connection_id, message).await;
                        }
                        Err(e) => warn!("Invalid message from {connection_id}: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.registry.remove(&connection_id);
    if let Err(e) = state.rooms.on_disconnect(&connection_id).await {
        warn!("Disconnect cleanup failed for {connection_id}: {e}");
    }
    info!("WebSocket disconnected: {connection_id}");
}

async fn handle_client_message(state: &AppState, connection_id: &ParticipantId, message: ClientMessage) {
    match message {
        ClientMessage::Join {
            room_id,
            username,
            role,
        } => {
            if let Err(e) = state
                .rooms
                .on_join(connection_id.clone(), &room_id, &username, role)
                .await
            {
                // Malformed joins are ignored without mutating room state.
                warn!("Join rejected for {connection_id}: {e}");
            }
        }
        ClientMessage::Leave { room_id } => {
            if let Err(e) = state.rooms.on_leave(connection_id, &room_id).await {
                warn!("Leave failed for {connection_id}: {e}");
            }
        }
        ClientMessage::Signal(mut envelope) => {
            // The sender's identity comes from the connection, not from
            // whatever the client put in the envelope.
            envelope.from = connection_id.clone();
            state.relay.relay(envelope);
        }
    }
}
