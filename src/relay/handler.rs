//! Relay connection and endpoint handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use super::events::{LaggedNotice, LatestResponse, StatsResponse};
use super::state::RelayState;

/// Served on `/` when the request is not a WebSocket upgrade
const BANNER: &str = "certstream-feed relay: connect with a WebSocket client to receive certificate updates";

/// `/` - WebSocket stream, or a banner for plain GETs
pub async fn root_handler(
    ws: Option<WebSocketUpgrade>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    State(state): State<Arc<RelayState>>,
) -> Response {
    match ws {
        Some(ws) => {
            let addr = client_addr(&headers, connect_info.map(|ConnectInfo(addr)| addr));
            ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
        }
        None => BANNER.into_response(),
    }
}

/// `/latest.json` - recent certificate packets
pub async fn latest_handler(State(state): State<Arc<RelayState>>) -> Json<LatestResponse> {
    Json(state.latest())
}

/// `/example.json` - a single packet, or `{}` before any arrived
pub async fn example_handler(State(state): State<Arc<RelayState>>) -> Json<Value> {
    Json(state.example().unwrap_or_else(|| json!({})))
}

/// Stats endpoint - connected clients and their connection age
pub async fn stats_handler(State(state): State<Arc<RelayState>>) -> Json<StatsResponse> {
    Json(state.stats())
}

/// Client address, preferring the first hop of `X-Forwarded-For`
pub fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<RelayState>, addr: String) {
    let mut rx = state.subscribe();
    let _registration = state.register_client(addr);

    loop {
        tokio::select! {
            // Relay frames to client
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame)).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("[Relay] Client lagged, skipped {} frames", n);
                        if let Ok(json) = serde_json::to_string(&LaggedNotice::new(n)) {
                            let _ = socket.send(Message::Text(json)).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break; // Channel closed
                    }
                }
            }

            // Clients only listen; watch for close and answer pings
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break, // WebSocket error
                    None => break, // Client disconnected
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_addr_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(client_addr(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_addr_falls_back_to_peer() {
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_addr(&HeaderMap::new(), Some(peer)), "127.0.0.1");
        assert_eq!(client_addr(&HeaderMap::new(), None), "unknown");
    }
}
