use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::server_state::ServerState;

/// Streams every trip update as a JSON text message until the client goes away.
pub async fn subscribe_updates(State(state): State<Arc<ServerState>>, ws: WebSocketUpgrade) -> Response {
    let rx = state.tx.subscribe();
    ws.on_upgrade(move |socket| forward_updates(socket, rx))
}

async fn forward_updates(mut socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    tracing::debug!("Update subscriber connected");
    while let Some(update) = next_update(&mut rx).await {
        if socket.send(Message::Text(update.into())).await.is_err() {
            break;
        }
    }
    tracing::debug!("Update subscriber disconnected");
}

/// Next update for one subscriber. Updates lost to a slow subscriber are skipped, `None`
/// once the channel is closed.
pub async fn next_update(rx: &mut broadcast::Receiver<String>) -> Option<String> {
    loop {
        match rx.recv().await {
            Ok(update) => return Some(update),
            Err(RecvError::Lagged(skipped)) => tracing::warn!("Update subscriber lagged, {} updates dropped", skipped),
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_subscriber_gets_the_latest_update() {
        let (tx, mut rx) = broadcast::channel(1);
        tx.send("first".to_string()).unwrap();
        tx.send("second".to_string()).unwrap();

        assert_eq!(next_update(&mut rx).await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn closed_channel_ends_the_stream() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send("only".to_string()).unwrap();
        drop(tx);

        assert_eq!(next_update(&mut rx).await.as_deref(), Some("only"));
        assert_eq!(next_update(&mut rx).await, None);
    }

    #[tokio::test]
    async fn accepted_webhook_reaches_subscribers() {
        let state = Arc::new(ServerState::new());
        let mut rx = state.tx.subscribe();
        let body = r#"{ "title": "Inland", "startLocation": "Vejle", "endLocation": "Herning", "waypoints": [] }"#;

        crate::webhook_endpoint::receive_trip(
            State(state.clone()),
            axum::extract::Path("abc".to_string()),
            axum::body::Bytes::from(body),
        )
        .await;

        let update: serde_json::Value = serde_json::from_str(&next_update(&mut rx).await.unwrap()).unwrap();
        assert_eq!(update["endpointId"], "abc");
        assert_eq!(update["title"], "Inland");
    }
}
