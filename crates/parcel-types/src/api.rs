//! API types for the parcel delivery HTTP API.
//!
//! This module defines the request and response bodies of the `/api/v1`
//! endpoints together with the structured error type that maps failures to
//! HTTP status codes.

use crate::order::Order;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for placing a new order.
///
/// `price` and `weight` are kept as raw JSON values so that a non-integer
/// value can be reported as an invalid field instead of a generic body
/// rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	pub origin: String,
	pub destination: String,
	pub price: serde_json::Value,
	pub weight: serde_json::Value,
	pub user_id: u64,
}

/// Response for a single order lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderResponse {
	pub order: Order,
}

/// Response for operations that create or change an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderActionResponse {
	/// Human-readable outcome.
	pub message: String,
	/// The order after the operation.
	pub order: Order,
}

/// Response for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
	pub orders: Vec<Order>,
	pub count: usize,
}

impl From<Vec<Order>> for OrderListResponse {
	fn from(orders: Vec<Order>) -> Self {
		Self {
			count: orders.len(),
			orders,
		}
	}
}

/// Response for the per-user listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOrdersResponse {
	pub user_id: u64,
	pub orders: Vec<Order>,
	pub count: usize,
}

/// Response for a successful deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOrderResponse {
	pub message: String,
	pub id: u64,
}

/// Response for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: String,
	pub orders: usize,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400)
	BadRequest { error_type: String, message: String },
	/// Unknown resource (404)
	NotFound { error_type: String, message: String },
	/// Request conflicts with the current resource state (409)
	Conflict { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::Conflict {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		(status, Json(self.to_error_response())).into_response()
	}
}
