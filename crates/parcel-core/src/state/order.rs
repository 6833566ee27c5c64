//! Order state machine implementation.
//!
//! Orders move Pending -> Approved -> In Transit -> Completed. A pending
//! order may instead be declined, and any order that has not yet left or
//! been finalized may be cancelled.

use once_cell::sync::Lazy;
use parcel_storage::{StorageError, StorageService};
use parcel_types::{Order, OrderStatus, Transition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during order state management.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("{message}")]
	InvalidTransition {
		transition: Transition,
		current: OrderStatus,
		message: String,
	},
	#[error("Order not found: {0}")]
	OrderNotFound(u64),
}

/// Allowed source statuses and the resulting status for each transition.
static TRANSITIONS: Lazy<HashMap<Transition, (HashSet<OrderStatus>, OrderStatus)>> =
	Lazy::new(|| {
		use OrderStatus::*;

		let mut m = HashMap::new();
		m.insert(Transition::Approve, (HashSet::from([Pending]), Approved));
		m.insert(Transition::Decline, (HashSet::from([Pending]), Declined));
		m.insert(
			Transition::MarkInTransit,
			(HashSet::from([Approved]), InTransit),
		);
		m.insert(Transition::Deliver, (HashSet::from([InTransit]), Completed));
		m.insert(
			Transition::Cancel,
			(HashSet::from([Pending, Approved, Declined]), Cancelled),
		);
		m
	});

/// Applies status transitions to stored orders.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Applies `transition` to the order with the given id.
	///
	/// The status is changed with a compare-and-set against the status the
	/// decision was based on. If another request moved the order in the
	/// meantime the decision is re-evaluated against the new status.
	pub async fn apply(&self, id: u64, transition: Transition) -> Result<Order, OrderStateError> {
		loop {
			let order = self.storage.retrieve(id).await.map_err(|e| map_storage(id, e))?;
			let next = Self::next_status(transition, order.status)?;

			match self.storage.update_status(id, order.status, next).await {
				Ok(updated) => return Ok(updated),
				Err(StorageError::Conflict { current }) => {
					// Statuses only move forward, so retries are bounded.
					tracing::debug!(
						order_id = id,
						%transition,
						%current,
						"Order status changed concurrently, re-evaluating"
					);
				},
				Err(e) => return Err(map_storage(id, e)),
			}
		}
	}

	/// Returns the status `transition` leads to from `current`.
	pub fn next_status(
		transition: Transition,
		current: OrderStatus,
	) -> Result<OrderStatus, OrderStateError> {
		match TRANSITIONS.get(&transition) {
			Some((sources, target)) if sources.contains(&current) => Ok(*target),
			_ => Err(OrderStateError::InvalidTransition {
				transition,
				current,
				message: rejection_message(transition, current),
			}),
		}
	}
}

/// Message reported when `transition` is not allowed from `current`.
fn rejection_message(transition: Transition, current: OrderStatus) -> String {
	match (transition, current) {
		(Transition::MarkInTransit | Transition::Deliver, OrderStatus::Pending) => {
			"please approve the order first".to_string()
		},
		(Transition::Deliver, OrderStatus::Approved) => "order is not in transit yet".to_string(),
		(Transition::Cancel, _) => format!("order already {}, cannot be cancelled", current),
		_ => format!("order already {}", current),
	}
}

fn map_storage(id: u64, error: StorageError) -> OrderStateError {
	match error {
		StorageError::NotFound => OrderStateError::OrderNotFound(id),
		other => OrderStateError::Storage(other.to_string()),
	}
}
