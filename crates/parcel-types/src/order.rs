//! Order types for the parcel delivery service.
//!
//! An order moves through a fixed lifecycle:
//! Pending -> Approved -> In Transit -> Completed, with Declined and
//! Cancelled as side branches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a parcel order.
///
/// Serialized with the human-readable labels clients see, so
/// `InTransit` goes over the wire as `"In Transit"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Order has been placed and awaits an admin decision.
	Pending,
	/// Order has been accepted for delivery.
	Approved,
	/// Order was rejected by an admin.
	Declined,
	/// Parcel is on the road.
	#[serde(rename = "In Transit")]
	InTransit,
	/// Parcel has been delivered.
	Completed,
	/// Order was withdrawn before it left.
	Cancelled,
}

impl OrderStatus {
	/// Returns the label used in API payloads and messages.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Pending",
			OrderStatus::Approved => "Approved",
			OrderStatus::Declined => "Declined",
			OrderStatus::InTransit => "In Transit",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
		}
	}

	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Approved,
			Self::Declined,
			Self::InTransit,
			Self::Completed,
			Self::Cancelled,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A status-changing operation that can be requested on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
	Approve,
	Decline,
	MarkInTransit,
	Deliver,
	Cancel,
}

impl Transition {
	/// Returns an iterator over all transitions.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Approve,
			Self::Decline,
			Self::MarkInTransit,
			Self::Deliver,
			Self::Cancel,
		]
		.into_iter()
	}
}

impl fmt::Display for Transition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Transition::Approve => "approve",
			Transition::Decline => "decline",
			Transition::MarkInTransit => "mark-in-transit",
			Transition::Deliver => "deliver",
			Transition::Cancel => "cancel",
		};
		f.write_str(name)
	}
}

/// A parcel delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Sequential identifier assigned by storage, never reused.
	pub id: u64,
	/// Identifier of the requesting user.
	pub user_id: u64,
	/// Pickup location, a member of the origin allow-list.
	pub origin: String,
	/// Drop-off location, a member of the destination allow-list.
	pub destination: String,
	/// Price of the delivery.
	pub price: u64,
	/// Weight of the parcel.
	pub weight: i64,
	/// Current lifecycle status.
	pub status: OrderStatus,
}

/// Validated order fields awaiting an identifier.
///
/// Storage backends turn a draft into an [`Order`] by assigning the next id
/// and the initial `Pending` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
	pub user_id: u64,
	pub origin: String,
	pub destination: String,
	pub price: u64,
	pub weight: i64,
}

impl OrderDraft {
	/// Builds the stored order for the given identifier.
	pub fn into_order(self, id: u64) -> Order {
		Order {
			id,
			user_id: self.user_id,
			origin: self.origin,
			destination: self.destination,
			price: self.price,
			weight: self.weight,
			status: OrderStatus::Pending,
		}
	}
}

/// Criteria for listing orders. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
	pub user_id: Option<u64>,
	pub status: Option<OrderStatus>,
}

impl OrderFilter {
	/// Filter matching every order.
	pub fn all() -> Self {
		Self::default()
	}

	/// Filter matching orders placed by `user_id`.
	pub fn by_user(user_id: u64) -> Self {
		Self {
			user_id: Some(user_id),
			status: None,
		}
	}

	/// Filter matching orders currently in `status`.
	pub fn by_status(status: OrderStatus) -> Self {
		Self {
			user_id: None,
			status: Some(status),
		}
	}

	/// Returns true if the order satisfies every set criterion.
	pub fn matches(&self, order: &Order) -> bool {
		self.user_id.is_none_or(|user_id| order.user_id == user_id)
			&& self.status.is_none_or(|status| order.status == status)
	}
}
