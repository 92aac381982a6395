use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use track_lib::TripData;

pub struct StoredTrip {
    pub trip: TripData,
    pub received_at: DateTime<Utc>,
}

/// Sent to every subscriber of `tx` when an endpoint's trip is replaced.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    pub endpoint_id: String,
    pub title: String,
    pub received_at: DateTime<Utc>,
}

pub struct ServerState {
    // Channel used to send messages to all connected clients. Drained by `/updates`.
    pub tx: broadcast::Sender<String>,
    /// Latest trip per webhook endpoint.
    pub trips: Mutex<HashMap<String, StoredTrip>>,
}

impl ServerState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            tx,
            trips: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
