//! Main entry point for the parcel delivery service.
//!
//! This binary loads configuration, builds the order engine on top of the
//! configured storage backend and serves the HTTP API until interrupted.

use clap::Parser;
use parcel_config::Config;
use parcel_core::{ParcelBuilder, ParcelEngine};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the parcel service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "PARCEL_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the parcel service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine with the configured storage backend
/// 5. Serves the API until Ctrl-C
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started parcel service");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let api_config = config.api.clone();
	let engine = Arc::new(build_engine(config)?);

	server::start_server(api_config, engine, shutdown_signal()).await?;

	tracing::info!("Stopped parcel service");
	Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!("Failed to listen for shutdown signal: {}", e);
		std::future::pending::<()>().await;
	}
	tracing::info!("Shutdown signal received");
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:expr => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the engine with every registered storage implementation available.
fn build_engine(config: Config) -> Result<ParcelEngine, Box<dyn std::error::Error>> {
	use parcel_storage::implementations::memory;

	let storage_factories = create_factory_map!(
		parcel_storage::StorageInterface,
		parcel_storage::StorageError,
		memory::NAME => memory::create_storage,
	);

	Ok(ParcelBuilder::new(config).build(storage_factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	const CONFIG: &str = r#"
[service]
id = "main-test"

[locations]
origins = ["Nairobi"]
destinations = ["Kisumu"]

[storage]
primary = "memory"
[storage.implementations.memory]

[api]
port = 8099
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["parcel"]).unwrap();

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args =
			Args::try_parse_from(["parcel", "--config", "custom.toml", "-l", "debug"]).unwrap();

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		use parcel_storage::implementations::memory::create_storage;
		use parcel_storage::{StorageError, StorageInterface};

		let factories = create_factory_map!(
			StorageInterface,
			StorageError,
			"memory" => create_storage,
		);

		assert_eq!(factories.len(), 1);
		assert!(factories.contains_key("memory"));
	}

	#[test]
	fn test_factory_map_covers_all_implementations() {
		let factories = create_factory_map!(
			parcel_storage::StorageInterface,
			parcel_storage::StorageError,
			parcel_storage::implementations::memory::NAME => parcel_storage::implementations::memory::create_storage,
		);

		for (name, _) in parcel_storage::get_all_implementations() {
			assert!(factories.contains_key(name), "missing factory for {}", name);
		}
	}

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("config.toml");
		std::fs::write(&config_path, CONFIG).expect("Failed to write config");

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.expect("Failed to load config");
		assert_eq!(config.api.port, 8099);

		let engine = build_engine(config).expect("Failed to build engine");
		assert_eq!(engine.config().service.id, "main-test");
		assert!(engine.config().locations.is_valid_destination("Kisumu"));
		assert!(!engine.config().locations.is_valid_destination("Mombasa"));
	}
}
