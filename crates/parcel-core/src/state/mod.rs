//! State management for orders.
//!
//! This module provides the state machine that owns the order status
//! lifecycle, validating every requested transition against the current
//! status before applying it through storage.

pub mod order;

pub use order::{OrderStateError, OrderStateMachine};
