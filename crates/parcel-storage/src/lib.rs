//! Storage module for the parcel delivery service.
//!
//! This module provides the abstraction over where orders live. Backends
//! own id assignment and must apply every operation atomically with respect
//! to other operations on the same backend.

use async_trait::async_trait;
use parcel_types::{Order, OrderDraft, OrderFilter, OrderStatus};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested order is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a conditional update observes a different status.
	#[error("Status conflict: current status is {current}")]
	Conflict { current: OrderStatus },
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for order storage backends.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Assigns the next identifier to `draft` and stores it as a `Pending` order.
	async fn insert(&self, draft: OrderDraft) -> Result<Order, StorageError>;

	/// Retrieves the order with the given id.
	async fn get(&self, id: u64) -> Result<Order, StorageError>;

	/// Returns the orders matching `filter` in insertion order.
	async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError>;

	/// Sets the status of an order to `to` if it is currently `expected`.
	///
	/// Returns [`StorageError::Conflict`] carrying the observed status when it
	/// differs from `expected`, leaving the order untouched.
	async fn compare_and_set_status(
		&self,
		id: u64,
		expected: OrderStatus,
		to: OrderStatus,
	) -> Result<Order, StorageError>;

	/// Removes an order and returns it.
	async fn remove(&self, id: u64) -> Result<Order, StorageError>;

	/// Returns the number of stored orders.
	async fn count(&self) -> Result<usize, StorageError>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must provide
/// to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::memory;

	vec![(memory::NAME, memory::create_storage as StorageFactory)]
}

/// High-level storage service used by the engine.
///
/// Wraps a backend and adds tracing around the mutating operations.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a new order built from `draft`.
	pub async fn store(&self, draft: OrderDraft) -> Result<Order, StorageError> {
		let order = self.backend.insert(draft).await?;
		tracing::debug!(order_id = order.id, "Stored order");
		Ok(order)
	}

	/// Retrieves an order by id.
	pub async fn retrieve(&self, id: u64) -> Result<Order, StorageError> {
		self.backend.get(id).await
	}

	/// Lists orders matching `filter`.
	pub async fn query(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
		self.backend.list(filter).await
	}

	/// Conditionally moves an order from `expected` to `to`.
	pub async fn update_status(
		&self,
		id: u64,
		expected: OrderStatus,
		to: OrderStatus,
	) -> Result<Order, StorageError> {
		let order = self.backend.compare_and_set_status(id, expected, to).await?;
		tracing::debug!(order_id = id, from = %expected, to = %to, "Updated order status");
		Ok(order)
	}

	/// Removes an order.
	pub async fn remove(&self, id: u64) -> Result<Order, StorageError> {
		let order = self.backend.remove(id).await?;
		tracing::debug!(order_id = id, "Removed order");
		Ok(order)
	}

	/// Returns the number of stored orders.
	pub async fn count(&self) -> Result<usize, StorageError> {
		self.backend.count().await
	}
}
