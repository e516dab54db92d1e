use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::room;
use crate::search;
use crate::shared::AppState;
use crate::websockets::websocket_handler;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// All HTTP and WebSocket routes
pub fn app_router(app_state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/rooms/create", post(room::create_room))
        .route("/api/rooms/:code", get(room::get_room))
        .route("/api/movies/search", get(search::search_movies))
        .route("/ws", get(websocket_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
