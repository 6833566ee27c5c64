//! HTTP API handlers for the parcel service.

pub mod parcel;
