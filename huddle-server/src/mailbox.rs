use crate::server::AppState;
use axum::Json;
use axum::extract::{Query, State};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Room-scoped one-slot rendezvous for the first offer, used when the
/// initiating participant has no live relay target yet (it posted its offer
/// before anyone else joined).
///
/// `publish` overwrites (last write wins); `fetch` does not clear, so a
/// joiner arriving after the offer was already consumed still sees it. That
/// bounded staleness is accepted: downstream negotiation renegotiates or
/// fails fast.
#[derive(Default)]
pub struct CallMailbox {
    slots: DashMap<String, Value>,
}

impl CallMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, room_id: &str, payload: Value) {
        debug!("Mailbox publish for {room_id}");
        self.slots.insert(room_id.to_string(), payload);
    }

    pub fn fetch(&self, room_id: &str) -> Option<Value> {
        self.slots.get(room_id).map(|entry| entry.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOffer {
    pub room_id: String,
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOfferQuery {
    pub room_id: String,
}

pub async fn submit_offer(
    State(state): State<AppState>,
    Json(request): Json<SubmitOffer>,
) -> Json<Value> {
    state.mailbox.publish(&request.room_id, request.payload);
    Json(json!({ "ok": true }))
}

pub async fn fetch_offer(
    State(state): State<AppState>,
    Query(query): Query<FetchOfferQuery>,
) -> Json<Value> {
    Json(json!({ "payload": state.mailbox.fetch(&query.room_id) }))
}
