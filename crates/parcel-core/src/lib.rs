//! Core engine for the parcel delivery service.
//!
//! This crate ties storage, configuration and the order state machine
//! together. [`ParcelEngine`] exposes every order operation the HTTP layer
//! needs: placing orders, looking them up, listing views, applying status
//! transitions and deleting orders.

pub mod builder;
pub mod state;
pub mod validation;

pub use builder::{BuilderError, ParcelBuilder};
pub use state::{OrderStateError, OrderStateMachine};

use parcel_config::{Config, LocationsConfig};
use parcel_storage::{StorageError, StorageService};
use parcel_types::{APIError, CreateOrderRequest, Order, OrderFilter, OrderStatus, Transition};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum ParcelError {
	#[error("invalid origin name: {0}")]
	InvalidOrigin(String),
	#[error("destination not valid: {0}")]
	InvalidDestination(String),
	#[error("Invalid {field}: {reason}")]
	InvalidField { field: &'static str, reason: String },
	#[error("order {0} not found")]
	NotFound(u64),
	#[error("{message}")]
	InvalidTransition {
		transition: Transition,
		current: OrderStatus,
		message: String,
	},
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<OrderStateError> for ParcelError {
	fn from(err: OrderStateError) -> Self {
		match err {
			OrderStateError::OrderNotFound(id) => ParcelError::NotFound(id),
			OrderStateError::InvalidTransition {
				transition,
				current,
				message,
			} => ParcelError::InvalidTransition {
				transition,
				current,
				message,
			},
			OrderStateError::Storage(message) => ParcelError::Storage(message),
		}
	}
}

impl From<ParcelError> for APIError {
	fn from(err: ParcelError) -> Self {
		let message = err.to_string();
		match err {
			ParcelError::InvalidOrigin(_) => APIError::BadRequest {
				error_type: "INVALID_ORIGIN".to_string(),
				message,
			},
			ParcelError::InvalidDestination(_) => APIError::BadRequest {
				error_type: "INVALID_DESTINATION".to_string(),
				message,
			},
			ParcelError::InvalidField { .. } => APIError::BadRequest {
				error_type: "INVALID_FIELD".to_string(),
				message,
			},
			ParcelError::NotFound(_) => APIError::NotFound {
				error_type: "ORDER_NOT_FOUND".to_string(),
				message,
			},
			ParcelError::InvalidTransition { .. } => APIError::Conflict {
				error_type: "INVALID_TRANSITION".to_string(),
				message,
			},
			ParcelError::Storage(_) => APIError::InternalServerError {
				error_type: "INTERNAL_ERROR".to_string(),
				message,
			},
		}
	}
}

fn map_storage(id: u64, error: StorageError) -> ParcelError {
	match error {
		StorageError::NotFound => ParcelError::NotFound(id),
		other => ParcelError::Storage(other.to_string()),
	}
}

/// The order store and its operations.
pub struct ParcelEngine {
	config: Config,
	storage: Arc<StorageService>,
	state_machine: OrderStateMachine,
}

impl ParcelEngine {
	/// Creates an engine over the given storage.
	pub fn new(config: Config, storage: Arc<StorageService>) -> Self {
		let state_machine = OrderStateMachine::new(Arc::clone(&storage));
		Self {
			config,
			storage,
			state_machine,
		}
	}

	/// Returns the configuration the engine was built with.
	pub fn config(&self) -> &Config {
		&self.config
	}

	fn locations(&self) -> &LocationsConfig {
		&self.config.locations
	}

	/// Validates a creation request and stores a new `Pending` order.
	///
	/// Nothing is stored when validation fails.
	pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, ParcelError> {
		let draft = validation::validate_create_request(request, self.locations())?;
		let order = self
			.storage
			.store(draft)
			.await
			.map_err(|e| ParcelError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = order.id,
			user_id = order.user_id,
			origin = %order.origin,
			destination = %order.destination,
			"Order placed"
		);
		Ok(order)
	}

	/// Looks up a single order.
	pub async fn get_order(&self, id: u64) -> Result<Order, ParcelError> {
		tracing::debug!(order_id = id, "Retrieving order");
		self.storage.retrieve(id).await.map_err(|e| map_storage(id, e))
	}

	/// Lists every order in insertion order.
	pub async fn list_orders(&self) -> Result<Vec<Order>, ParcelError> {
		self.query(OrderFilter::all()).await
	}

	/// Lists the orders placed by `user_id`.
	pub async fn list_orders_by_user(&self, user_id: u64) -> Result<Vec<Order>, ParcelError> {
		self.query(OrderFilter::by_user(user_id)).await
	}

	/// Lists the orders currently in `status`.
	pub async fn list_orders_by_status(
		&self,
		status: OrderStatus,
	) -> Result<Vec<Order>, ParcelError> {
		self.query(OrderFilter::by_status(status)).await
	}

	async fn query(&self, filter: OrderFilter) -> Result<Vec<Order>, ParcelError> {
		tracing::debug!(?filter, "Listing orders");
		self.storage
			.query(&filter)
			.await
			.map_err(|e| ParcelError::Storage(e.to_string()))
	}

	/// Applies a status transition to an order.
	pub async fn transition_order(
		&self,
		id: u64,
		transition: Transition,
	) -> Result<Order, ParcelError> {
		let order = self.state_machine.apply(id, transition).await?;
		tracing::info!(order_id = id, %transition, status = %order.status, "Order status changed");
		Ok(order)
	}

	/// Removes an order from the store.
	pub async fn delete_order(&self, id: u64) -> Result<Order, ParcelError> {
		let order = self.storage.remove(id).await.map_err(|e| map_storage(id, e))?;
		tracing::info!(order_id = id, "Order deleted");
		Ok(order)
	}

	/// Returns the number of stored orders.
	pub async fn order_count(&self) -> Result<usize, ParcelError> {
		self.storage
			.count()
			.await
			.map_err(|e| ParcelError::Storage(e.to_string()))
	}
}
