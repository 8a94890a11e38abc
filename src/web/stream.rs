use axum::extract::ws::Message;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::history::{HistoryEntry, SharedHistory};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Sent on every snapshot delivery; `None` means the feed is empty.
    Latest(Option<HistoryEntry>),
    /// A new event appeared at the top of the feed.
    Alert(HistoryEntry),
}

#[derive(Clone)]
pub struct WebState {
    pub tx: broadcast::Sender<WsMessage>,
    pub history: SharedHistory,
    pub station: String,
}

impl WebState {
    pub fn new(history: SharedHistory, station: String) -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx, history, station }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.tx.subscribe()
    }

    pub fn broadcast_latest(&self, entry: Option<HistoryEntry>) {
        let _ = self.tx.send(WsMessage::Latest(entry));
    }

    pub fn broadcast_alert(&self, entry: HistoryEntry) {
        let _ = self.tx.send(WsMessage::Alert(entry));
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: axum::extract::ws::WebSocket, state: WebState) {
    let (mut sender, _) = socket.split();
    let mut rx = state.subscribe();

    while let Ok(msg) = rx.recv().await {
        if let Ok(json) = serde_json::to_string(&msg) {
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    }
}
