//! Validation of order creation requests.
//!
//! Checks run in a fixed order: destination, origin, price, weight. The
//! first failing check determines the error.

use crate::ParcelError;
use parcel_config::LocationsConfig;
use parcel_types::{CreateOrderRequest, OrderDraft};
use serde_json::Value;

/// Validates `request` against the location allow-lists and field types.
pub fn validate_create_request(
	request: CreateOrderRequest,
	locations: &LocationsConfig,
) -> Result<OrderDraft, ParcelError> {
	if !locations.is_valid_destination(&request.destination) {
		return Err(ParcelError::InvalidDestination(request.destination));
	}
	if !locations.is_valid_origin(&request.origin) {
		return Err(ParcelError::InvalidOrigin(request.origin));
	}

	let price = request.price.as_u64().ok_or_else(|| ParcelError::InvalidField {
		field: "price",
		reason: format!("expected a non-negative integer, got {}", describe(&request.price)),
	})?;
	let weight = request.weight.as_i64().ok_or_else(|| ParcelError::InvalidField {
		field: "weight",
		reason: format!("expected an integer, got {}", describe(&request.weight)),
	})?;

	Ok(OrderDraft {
		user_id: request.user_id,
		origin: request.origin,
		destination: request.destination,
		price,
		weight,
	})
}

fn describe(value: &Value) -> String {
	match value {
		Value::Null => "null".to_string(),
		Value::Bool(_) => "a boolean".to_string(),
		Value::Number(n) => n.to_string(),
		Value::String(_) => "a string".to_string(),
		Value::Array(_) => "an array".to_string(),
		Value::Object(_) => "an object".to_string(),
	}
}
