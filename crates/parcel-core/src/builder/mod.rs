//! Builder for constructing parcel engines.
//!
//! Resolves the primary storage backend from configuration through a map of
//! factory functions and wires it into a [`ParcelEngine`].

use crate::ParcelEngine;
use parcel_config::Config;
use parcel_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Builder for constructing a ParcelEngine with a pluggable storage backend.
pub struct ParcelBuilder {
	config: Config,
}

impl ParcelBuilder {
	/// Creates a new ParcelBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine, creating the primary storage with its factory.
	pub fn build<SF>(self, storage_factories: HashMap<String, SF>) -> Result<ParcelEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = self.config.storage.primary.clone();

		let factory = storage_factories.get(&primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"No storage implementation registered as '{}'",
				primary
			))
		})?;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(&primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary storage '{}' not found in implementations",
					primary
				))
			})?;

		let backend = match factory(storage_config) {
			Ok(backend) => backend,
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)));
			},
		};
		tracing::info!(component = "storage", implementation = %primary, "Loaded");

		let storage = Arc::new(StorageService::new(backend));
		Ok(ParcelEngine::new(self.config, storage))
	}
}
