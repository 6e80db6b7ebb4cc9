//! `GET /orders/stream` - Server-Sent Events over the order feed.
//!
//! Each event's `data` is the full order list as a JSON array. The feed is
//! dropped with the response body when the client disconnects, which stops
//! its producer; server shutdown cancels it through the state's signal.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use super::dto::OrderResponse;
use super::AppState;
use crate::store::OrderStore;

pub async fn orders<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("order stream opened");
    let feed = state.service.stream_all(state.shutdown.clone());

    let events = feed.map(|orders| {
        let body: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
        Event::default().json_data(body)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
