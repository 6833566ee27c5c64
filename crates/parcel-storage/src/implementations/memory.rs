//! In-memory storage backend implementation for the parcel service.
//!
//! Orders live in a map keyed by id behind a single read-write lock. Ids are
//! handed out in increasing order, so iterating the map yields orders in the
//! order they were placed. Nothing survives a restart.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use parcel_types::{Order, OrderDraft, OrderFilter, OrderStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name under which this backend is registered.
pub const NAME: &str = "memory";

struct MemoryState {
	orders: BTreeMap<u64, Order>,
	/// Next id to hand out. Never decremented, so deleted ids are not reused.
	next_id: u64,
}

/// In-memory storage implementation.
pub struct MemoryStorage {
	state: Arc<RwLock<MemoryState>>,
}

impl MemoryStorage {
	/// Creates a new, empty MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			state: Arc::new(RwLock::new(MemoryState {
				orders: BTreeMap::new(),
				next_id: 1,
			})),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn insert(&self, draft: OrderDraft) -> Result<Order, StorageError> {
		let mut state = self.state.write().await;
		let id = state.next_id;
		state.next_id = id
			.checked_add(1)
			.ok_or_else(|| StorageError::Backend("order id space exhausted".into()))?;

		let order = draft.into_order(id);
		state.orders.insert(id, order.clone());
		Ok(order)
	}

	async fn get(&self, id: u64) -> Result<Order, StorageError> {
		let state = self.state.read().await;
		state.orders.get(&id).cloned().ok_or(StorageError::NotFound)
	}

	async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
		let state = self.state.read().await;
		Ok(state
			.orders
			.values()
			.filter(|order| filter.matches(order))
			.cloned()
			.collect())
	}

	async fn compare_and_set_status(
		&self,
		id: u64,
		expected: OrderStatus,
		to: OrderStatus,
	) -> Result<Order, StorageError> {
		let mut state = self.state.write().await;
		let order = state.orders.get_mut(&id).ok_or(StorageError::NotFound)?;
		if order.status != expected {
			return Err(StorageError::Conflict {
				current: order.status,
			});
		}
		order.status = to;
		Ok(order.clone())
	}

	async fn remove(&self, id: u64) -> Result<Order, StorageError> {
		let mut state = self.state.write().await;
		state.orders.remove(&id).ok_or(StorageError::NotFound)
	}

	async fn count(&self) -> Result<usize, StorageError> {
		Ok(self.state.read().await.orders.len())
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// The memory backend takes no options; its section must be a (possibly
/// empty) table.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	if !config.is_table() {
		return Err(StorageError::Configuration(
			"memory storage configuration must be a table".into(),
		));
	}
	Ok(Box::new(MemoryStorage::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn draft(user_id: u64) -> OrderDraft {
		OrderDraft {
			user_id,
			origin: "Nairobi".to_string(),
			destination: "Kisumu".to_string(),
			price: 500,
			weight: 10,
		}
	}

	#[tokio::test]
	async fn test_ids_are_sequential_and_not_reused() {
		let storage = MemoryStorage::new();

		let first = storage.insert(draft(1)).await.unwrap();
		let second = storage.insert(draft(1)).await.unwrap();
		assert_eq!(first.id, 1);
		assert_eq!(second.id, 2);
		assert_eq!(first.status, OrderStatus::Pending);

		storage.remove(second.id).await.unwrap();
		let third = storage.insert(draft(1)).await.unwrap();
		assert_eq!(third.id, 3);
	}

	#[tokio::test]
	async fn test_list_preserves_insertion_order_and_filters() {
		let storage = MemoryStorage::new();
		for user_id in [5, 6, 5, 7] {
			storage.insert(draft(user_id)).await.unwrap();
		}
		storage
			.compare_and_set_status(3, OrderStatus::Pending, OrderStatus::Approved)
			.await
			.unwrap();

		let all: Vec<u64> = storage
			.list(&OrderFilter::all())
			.await
			.unwrap()
			.iter()
			.map(|o| o.id)
			.collect();
		assert_eq!(all, vec![1, 2, 3, 4]);

		let by_user: Vec<u64> = storage
			.list(&OrderFilter::by_user(5))
			.await
			.unwrap()
			.iter()
			.map(|o| o.id)
			.collect();
		assert_eq!(by_user, vec![1, 3]);

		let pending: Vec<u64> = storage
			.list(&OrderFilter::by_status(OrderStatus::Pending))
			.await
			.unwrap()
			.iter()
			.map(|o| o.id)
			.collect();
		assert_eq!(pending, vec![1, 2, 4]);
	}

	#[tokio::test]
	async fn test_compare_and_set_conflict_leaves_order_untouched() {
		let storage = MemoryStorage::new();
		let order = storage.insert(draft(1)).await.unwrap();

		let result = storage
			.compare_and_set_status(order.id, OrderStatus::Approved, OrderStatus::InTransit)
			.await;
		assert!(matches!(
			result,
			Err(StorageError::Conflict {
				current: OrderStatus::Pending
			})
		));
		assert_eq!(
			storage.get(order.id).await.unwrap().status,
			OrderStatus::Pending
		);
	}

	#[tokio::test]
	async fn test_missing_order() {
		let storage = MemoryStorage::new();

		assert!(matches!(storage.get(9).await, Err(StorageError::NotFound)));
		assert!(matches!(storage.remove(9).await, Err(StorageError::NotFound)));
		assert!(matches!(
			storage
				.compare_and_set_status(9, OrderStatus::Pending, OrderStatus::Approved)
				.await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_inserts_get_unique_ids() {
		let storage = Arc::new(MemoryStorage::new());

		let handles: Vec<_> = (0..50)
			.map(|i| {
				let storage = Arc::clone(&storage);
				tokio::spawn(async move { storage.insert(draft(i)).await.unwrap().id })
			})
			.collect();

		let mut ids = Vec::new();
		for handle in handles {
			ids.push(handle.await.unwrap());
		}
		ids.sort_unstable();
		ids.dedup();
		assert_eq!(ids.len(), 50);
		assert_eq!(storage.count().await.unwrap(), 50);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_compare_and_set_has_single_winner() {
		let storage = Arc::new(MemoryStorage::new());
		let id = storage.insert(draft(1)).await.unwrap().id;

		let handles: Vec<_> = (0..16)
			.map(|_| {
				let storage = Arc::clone(&storage);
				tokio::spawn(async move {
					storage
						.compare_and_set_status(id, OrderStatus::Pending, OrderStatus::Approved)
						.await
						.is_ok()
				})
			})
			.collect();

		let mut winners = 0;
		for handle in handles {
			if handle.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
	}

	#[test]
	fn test_factory_rejects_non_table_config() {
		assert!(create_storage(&toml::Value::Table(toml::map::Map::new())).is_ok());
		assert!(matches!(
			create_storage(&toml::Value::String("fast".into())),
			Err(StorageError::Configuration(_))
		));
	}
}
