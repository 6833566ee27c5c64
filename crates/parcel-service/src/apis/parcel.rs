//! Parcel order API implementation.
//!
//! Handlers for the `/parcels` and `/users/{user_id}/parcels` endpoints.
//! Each handler is a thin adapter over [`ParcelEngine`]: extract, call,
//! wrap the result in a response body.

use crate::server::AppState;
use axum::{
	extract::{rejection::JsonRejection, FromRequestParts, Path, State},
	http::{request::Parts, StatusCode},
	response::Json,
};
use parcel_types::{
	APIError, CreateOrderRequest, DeleteOrderResponse, GetOrderResponse, HealthResponse,
	OrderActionResponse, OrderListResponse, OrderStatus, Transition, UserOrdersResponse,
};
use tracing::warn;

/// Numeric path parameter (`{id}` or `{user_id}`).
///
/// Rejects non-numeric segments with a JSON error body instead of axum's
/// plain-text rejection.
pub struct IdParam(pub u64);

impl<S> FromRequestParts<S> for IdParam
where
	S: Send + Sync,
{
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		match Path::<u64>::from_request_parts(parts, state).await {
			Ok(Path(id)) => Ok(IdParam(id)),
			Err(rejection) => Err(APIError::BadRequest {
				error_type: "INVALID_ID".to_string(),
				message: rejection.body_text(),
			}),
		}
	}
}

/// Success message for each transition.
fn transition_message(transition: Transition) -> &'static str {
	match transition {
		Transition::Approve => "your parcel order has been approved",
		Transition::Decline => "Order declined",
		Transition::MarkInTransit => "The order is now on the road",
		Transition::Deliver => "The order has been delivered",
		Transition::Cancel => "parcel order cancelled successfully",
	}
}

/// Handles POST /parcels.
pub async fn create_parcel(
	State(state): State<AppState>,
	payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderActionResponse>), APIError> {
	let Json(request) = payload.map_err(|rejection| {
		warn!("Rejected order body: {}", rejection.body_text());
		APIError::BadRequest {
			error_type: "INVALID_REQUEST".to_string(),
			message: rejection.body_text(),
		}
	})?;

	match state.engine.create_order(request).await {
		Ok(order) => Ok((
			StatusCode::CREATED,
			Json(OrderActionResponse {
				message: "Order placed waiting for approval!".to_string(),
				order,
			}),
		)),
		Err(e) => {
			warn!("Order creation failed: {}", e);
			Err(APIError::from(e))
		},
	}
}

/// Handles GET /parcels.
pub async fn list_parcels(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	let orders = state.engine.list_orders().await?;
	Ok(Json(orders.into()))
}

/// Lists the orders in `status`; backs the per-status views.
async fn list_parcels_in(
	state: &AppState,
	status: OrderStatus,
) -> Result<Json<OrderListResponse>, APIError> {
	let orders = state.engine.list_orders_by_status(status).await?;
	Ok(Json(orders.into()))
}

/// Handles GET /parcels/accepted.
pub async fn list_accepted(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	list_parcels_in(&state, OrderStatus::Approved).await
}

/// Handles GET /parcels/delivered.
pub async fn list_delivered(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	list_parcels_in(&state, OrderStatus::Completed).await
}

/// Handles GET /parcels/declined.
pub async fn list_declined(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	list_parcels_in(&state, OrderStatus::Declined).await
}

/// Handles GET /parcels/moving.
pub async fn list_moving(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	list_parcels_in(&state, OrderStatus::InTransit).await
}

/// Handles GET /parcels/pending.
pub async fn list_pending(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	list_parcels_in(&state, OrderStatus::Pending).await
}

/// Handles GET /parcels/cancelled.
pub async fn list_cancelled(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	list_parcels_in(&state, OrderStatus::Cancelled).await
}

/// Handles GET /parcels/{id}.
pub async fn get_parcel(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<GetOrderResponse>, APIError> {
	match state.engine.get_order(id).await {
		Ok(order) => Ok(Json(GetOrderResponse { order })),
		Err(e) => {
			warn!("Order retrieval failed: {}", e);
			Err(APIError::from(e))
		},
	}
}

/// Applies `transition` to order `id` and builds the response.
async fn transition_parcel(
	state: &AppState,
	id: u64,
	transition: Transition,
) -> Result<Json<OrderActionResponse>, APIError> {
	match state.engine.transition_order(id, transition).await {
		Ok(order) => Ok(Json(OrderActionResponse {
			message: transition_message(transition).to_string(),
			order,
		})),
		Err(e) => {
			warn!(order_id = id, %transition, "Transition rejected: {}", e);
			Err(APIError::from(e))
		},
	}
}

/// Handles PUT /parcels/{id} and PUT /parcels/{id}/approved.
pub async fn approve_parcel(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<OrderActionResponse>, APIError> {
	transition_parcel(&state, id, Transition::Approve).await
}

/// Handles PUT /parcels/{id}/declined.
pub async fn decline_parcel(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<OrderActionResponse>, APIError> {
	transition_parcel(&state, id, Transition::Decline).await
}

/// Handles PUT /parcels/{id}/moving.
pub async fn mark_parcel_in_transit(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<OrderActionResponse>, APIError> {
	transition_parcel(&state, id, Transition::MarkInTransit).await
}

/// Handles PUT /parcels/{id}/delivered.
pub async fn deliver_parcel(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<OrderActionResponse>, APIError> {
	transition_parcel(&state, id, Transition::Deliver).await
}

/// Handles PUT /parcels/{id}/cancel.
pub async fn cancel_parcel(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<OrderActionResponse>, APIError> {
	transition_parcel(&state, id, Transition::Cancel).await
}

/// Handles DELETE /parcels/{id}.
pub async fn delete_parcel(
	IdParam(id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<DeleteOrderResponse>, APIError> {
	match state.engine.delete_order(id).await {
		Ok(order) => Ok(Json(DeleteOrderResponse {
			message: "order deleted successfully".to_string(),
			id: order.id,
		})),
		Err(e) => {
			warn!("Order deletion failed: {}", e);
			Err(APIError::from(e))
		},
	}
}

/// Handles GET /users/{user_id}/parcels.
pub async fn list_user_parcels(
	IdParam(user_id): IdParam,
	State(state): State<AppState>,
) -> Result<Json<UserOrdersResponse>, APIError> {
	let orders = state.engine.list_orders_by_user(user_id).await?;
	Ok(Json(UserOrdersResponse {
		user_id,
		count: orders.len(),
		orders,
	}))
}

/// Handles GET /health.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, APIError> {
	let orders = state.engine.order_count().await?;
	Ok(Json(HealthResponse {
		status: "ok".to_string(),
		orders,
	}))
}
