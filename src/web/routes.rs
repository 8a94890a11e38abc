use axum::{extract::State, routing::get, Json, Router};
use tower_http::cors::CorsLayer;

use crate::history::HistoryEntry;
use crate::web::stream::{ws_handler, WebState};

pub async fn create_router(state: WebState) -> Router {
    Router::new()
        .route("/api/latest", get(get_latest))
        .route("/api/history", get(get_history))
        .route("/api/station", get(get_station_name))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_latest(State(state): State<WebState>) -> Json<Option<HistoryEntry>> {
    let history = state.history.lock().unwrap();
    Json(history.latest())
}

async fn get_history(State(state): State<WebState>) -> Json<Vec<HistoryEntry>> {
    let history = state.history.lock().unwrap();
    Json(history.entries())
}

async fn get_station_name(State(state): State<WebState>) -> Json<String> {
    Json(state.station.clone())
}
