//! HTTP server for the parcel service API.
//!
//! Routes are nested under `/api/v1`; a `/health` probe sits at the root.

use crate::apis::parcel;
use axum::{
	extract::DefaultBodyLimit,
	routing::{get, put},
	Router,
};
use parcel_config::ApiConfig;
use parcel_core::ParcelEngine;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Order store used by every handler.
	pub engine: Arc<ParcelEngine>,
}

/// Builds the application router.
pub fn router(engine: Arc<ParcelEngine>, max_request_size: usize) -> Router {
	let parcels = Router::new()
		.route(
			"/parcels",
			get(parcel::list_parcels).post(parcel::create_parcel),
		)
		.route("/parcels/accepted", get(parcel::list_accepted))
		.route("/parcels/delivered", get(parcel::list_delivered))
		.route("/parcels/declined", get(parcel::list_declined))
		.route("/parcels/moving", get(parcel::list_moving))
		.route("/parcels/pending", get(parcel::list_pending))
		.route("/parcels/cancelled", get(parcel::list_cancelled))
		.route(
			"/parcels/{id}",
			get(parcel::get_parcel)
				.put(parcel::approve_parcel)
				.delete(parcel::delete_parcel),
		)
		.route("/parcels/{id}/approved", put(parcel::approve_parcel))
		.route("/parcels/{id}/declined", put(parcel::decline_parcel))
		.route("/parcels/{id}/moving", put(parcel::mark_parcel_in_transit))
		.route("/parcels/{id}/delivered", put(parcel::deliver_parcel))
		.route("/parcels/{id}/cancel", put(parcel::cancel_parcel))
		.route("/users/{user_id}/parcels", get(parcel::list_user_parcels));

	Router::new()
		.nest("/api/v1", parcels)
		.route("/health", get(parcel::health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive())
				.layer(DefaultBodyLimit::max(max_request_size)),
		)
		.with_state(AppState { engine })
}

/// Starts the HTTP server and serves until `shutdown` resolves.
pub async fn start_server<F>(
	api_config: ApiConfig,
	engine: Arc<ParcelEngine>,
	shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
	F: Future<Output = ()> + Send + 'static,
{
	let app = router(engine, api_config.max_request_size);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Parcel API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown)
		.await?;

	tracing::info!("Parcel API server stopped");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		body::{to_bytes, Body},
		http::{Method, Request, StatusCode},
	};
	use parcel_config::Config;
	use parcel_core::ParcelBuilder;
	use parcel_storage::{implementations::memory::create_storage, StorageFactory};
	use serde_json::{json, Value};
	use std::collections::HashMap;
	use tower::ServiceExt;

	fn test_router() -> Router {
		let config: Config = r#"
[service]
id = "server-test"

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		let mut factories = HashMap::new();
		factories.insert("memory".to_string(), create_storage as StorageFactory);
		let engine = ParcelBuilder::new(config).build(factories).unwrap();
		router(Arc::new(engine), 64 * 1024)
	}

	async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let mut builder = Request::builder().method(method).uri(uri);
		let body = match body {
			Some(json) => {
				builder = builder.header("content-type", "application/json");
				Body::from(json.to_string())
			},
			None => Body::empty(),
		};

		let response = app
			.clone()
			.oneshot(builder.body(body).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let value = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, value)
	}

	fn order_body(destination: &str) -> Value {
		json!({
			"origin": "Nairobi",
			"destination": destination,
			"price": 500,
			"weight": 10,
			"user_id": 7
		})
	}

	#[tokio::test]
	async fn test_lifecycle_over_http() {
		let app = test_router();

		let (status, body) = send(&app, Method::POST, "/api/v1/parcels", Some(order_body("Kisumu"))).await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["order"]["id"], 1);
		assert_eq!(body["order"]["status"], "Pending");

		let (status, body) = send(&app, Method::PUT, "/api/v1/parcels/1", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["order"]["status"], "Approved");

		let (status, body) = send(&app, Method::PUT, "/api/v1/parcels/1/moving", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["order"]["status"], "In Transit");

		let (status, body) = send(&app, Method::PUT, "/api/v1/parcels/1/delivered", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["order"]["status"], "Completed");

		let (status, body) = send(&app, Method::PUT, "/api/v1/parcels/1/declined", None).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_TRANSITION");
		assert_eq!(body["message"], "order already Completed");

		let (status, body) = send(&app, Method::PUT, "/api/v1/parcels/1/cancel", None).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["message"], "order already Completed, cannot be cancelled");

		let (status, body) = send(&app, Method::GET, "/api/v1/parcels/1", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["order"]["status"], "Completed");
	}

	#[tokio::test]
	async fn test_create_validation_errors() {
		let app = test_router();

		let (status, body) = send(&app, Method::POST, "/api/v1/parcels", Some(order_body("Atlantis"))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_DESTINATION");

		let mut bad_origin = order_body("Kisumu");
		bad_origin["origin"] = json!("Gotham");
		let (status, body) = send(&app, Method::POST, "/api/v1/parcels", Some(bad_origin)).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_ORIGIN");

		let mut bad_price = order_body("Kisumu");
		bad_price["price"] = json!("500");
		let (status, body) = send(&app, Method::POST, "/api/v1/parcels", Some(bad_price)).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_FIELD");

		let (status, body) = send(&app, Method::POST, "/api/v1/parcels", Some(json!({"origin": "Nairobi"}))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_REQUEST");

		let (_, body) = send(&app, Method::GET, "/api/v1/parcels", None).await;
		assert_eq!(body["count"], 0);
	}

	#[tokio::test]
	async fn test_status_views_and_user_listing() {
		let app = test_router();
		for _ in 0..4 {
			send(&app, Method::POST, "/api/v1/parcels", Some(order_body("Kisumu"))).await;
		}
		let mut other_user = order_body("Mombasa");
		other_user["user_id"] = json!(9);
		send(&app, Method::POST, "/api/v1/parcels", Some(other_user)).await;

		send(&app, Method::PUT, "/api/v1/parcels/1/approved", None).await;
		send(&app, Method::PUT, "/api/v1/parcels/2/approved", None).await;
		send(&app, Method::PUT, "/api/v1/parcels/2/moving", None).await;
		send(&app, Method::PUT, "/api/v1/parcels/3/declined", None).await;
		send(&app, Method::PUT, "/api/v1/parcels/4/cancel", None).await;

		for (view, expected) in [
			("accepted", vec![1u64]),
			("moving", vec![2]),
			("declined", vec![3]),
			("cancelled", vec![4]),
			("pending", vec![5]),
			("delivered", vec![]),
		] {
			let (status, body) = send(&app, Method::GET, &format!("/api/v1/parcels/{}", view), None).await;
			assert_eq!(status, StatusCode::OK, "{}", view);
			let ids: Vec<u64> = body["orders"]
				.as_array()
				.unwrap()
				.iter()
				.map(|o| o["id"].as_u64().unwrap())
				.collect();
			assert_eq!(ids, expected, "{}", view);
		}

		let (status, body) = send(&app, Method::GET, "/api/v1/users/9/parcels", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["user_id"], 9);
		assert_eq!(body["count"], 1);
		assert_eq!(body["orders"][0]["destination"], "Mombasa");
	}

	#[tokio::test]
	async fn test_delete_and_unknown_ids() {
		let app = test_router();
		send(&app, Method::POST, "/api/v1/parcels", Some(order_body("Kisumu"))).await;

		let (status, body) = send(&app, Method::DELETE, "/api/v1/parcels/1", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["id"], 1);

		let (status, body) = send(&app, Method::GET, "/api/v1/parcels/1", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "ORDER_NOT_FOUND");

		let (status, _) = send(&app, Method::DELETE, "/api/v1/parcels/1", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, _) = send(&app, Method::PUT, "/api/v1/parcels/1/cancel", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, body) = send(&app, Method::GET, "/api/v1/parcels/abc", None).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_ID");
	}

	#[tokio::test]
	async fn test_moving_before_approval_is_rejected() {
		let app = test_router();
		send(&app, Method::POST, "/api/v1/parcels", Some(order_body("Kisumu"))).await;

		let (status, body) = send(&app, Method::PUT, "/api/v1/parcels/1/moving", None).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["message"], "please approve the order first");

		let (_, body) = send(&app, Method::GET, "/api/v1/parcels/1", None).await;
		assert_eq!(body["order"]["status"], "Pending");
	}

	#[tokio::test]
	async fn test_health() {
		let app = test_router();
		send(&app, Method::POST, "/api/v1/parcels", Some(order_body("Kisumu"))).await;

		let (status, body) = send(&app, Method::GET, "/health", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
		assert_eq!(body["orders"], 1);
	}
}
