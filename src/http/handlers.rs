use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use super::dto::{OrderRequest, OrderResponse};
use super::error::ApiError;
use super::AppState;
use crate::order::{OrderDraft, OrderId};
use crate::store::OrderStore;

type ApiResult<T> = Result<T, ApiError>;

fn order_id(path: Result<Path<OrderId>, PathRejection>) -> ApiResult<OrderId> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            debug!(error = %rejection, "unparsable order id");
            Err(ApiError::NotFound)
        }
    }
}

fn draft(body: Result<Json<OrderRequest>, JsonRejection>) -> ApiResult<OrderDraft> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    OrderDraft::try_from(request).map_err(ApiError::Validation)
}

/// `GET /orders`
pub async fn list<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = state.service.get_all().await.map_err(|e| state.internal(e))?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// `GET /orders/:id`
pub async fn get<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let id = order_id(path)?;
    match state.service.get_by_id(id).await.map_err(|e| state.internal(e))? {
        Some(order) => Ok(Json(order.into())),
        None => Err(ApiError::NotFound),
    }
}

/// `POST /orders` - 201 with a `Location` header.
pub async fn create<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let draft = draft(body)?;
    let order = state.service.create(draft).await.map_err(|e| state.internal(e))?;

    let location = format!("/orders/{}", order.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(OrderResponse::from(order)),
    )
        .into_response())
}

/// `PUT /orders/:id`
pub async fn update<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let id = order_id(path)?;
    let draft = draft(body)?;
    match state.service.update(id, draft).await.map_err(|e| state.internal(e))? {
        Some(order) => Ok(Json(order.into())),
        None => Err(ApiError::NotFound),
    }
}

/// `DELETE /orders/:id` - 204, or 404 if absent.
pub async fn delete<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = order_id(path)?;
    if state.service.delete(id).await.map_err(|e| state.internal(e))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// `GET /health` - store reachability.
pub async fn health<S: OrderStore + 'static>(State(state): State<AppState<S>>) -> Response {
    let store = state.service.store().kind();
    match state.service.health().await {
        Ok(()) => Json(json!({ "status": "healthy", "store": store })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            let body = json!({ "status": "unhealthy", "store": store, "error": e.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}
