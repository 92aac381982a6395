use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use track_lib::webhook::ingest_slice;

use crate::{
    server_state::{ServerState, StoredTrip, TripUpdate},
    updates::subscribe_updates,
};

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/webhook/{endpoint_id}", post(receive_trip))
        .route("/trip/{endpoint_id}", get(get_trip))
        .route("/updates", get(subscribe_updates))
        .with_state(state)
}

pub async fn receive_trip(State(state): State<Arc<ServerState>>, Path(endpoint_id): Path<String>, body: Bytes) -> Response {
    let trip = match ingest_slice(&body) {
        Ok(trip) => trip,
        Err(err) => {
            tracing::warn!("Rejected trip for endpoint {}: {}", endpoint_id, err);
            let body = json!({ "error": err.to_string(), "field": err.field() });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
        }
    };

    tracing::info!("Received trip '{}' with {} waypoints for endpoint {}", trip.title, trip.waypoints.len(), endpoint_id);

    let received_at = Utc::now();
    let update = TripUpdate {
        endpoint_id: endpoint_id.clone(),
        title: trip.title.clone(),
        received_at,
    };

    state.trips.lock().await.insert(
        endpoint_id,
        StoredTrip {
            trip: trip.clone(),
            received_at,
        },
    );

    match serde_json::to_string(&update) {
        // Nobody listening is fine.
        Ok(message) => {
            let _ = state.tx.send(message);
        }
        Err(err) => tracing::error!("Failed to serialize trip update: {err:?}"),
    }

    Json(trip).into_response()
}

pub async fn get_trip(State(state): State<Arc<ServerState>>, Path(endpoint_id): Path<String>) -> Response {
    let trips = state.trips.lock().await;
    match trips.get(&endpoint_id) {
        Some(stored) => {
            tracing::debug!("Serving trip for endpoint {} received at {}", endpoint_id, stored.received_at);
            Json(&stored.trip).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
