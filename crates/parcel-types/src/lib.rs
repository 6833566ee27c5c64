//! Common types module for the parcel delivery service.
//!
//! This module defines the core data types shared by every crate in the
//! workspace: the order record and its status lifecycle, the filters used by
//! storage queries, and the request/response types of the HTTP API.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Order types including the status lifecycle and query filters.
pub mod order;

// Re-export all types for convenient access
pub use api::*;
pub use order::*;
