//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    decrease_handler, delete_handler, flush_handler, get_handler, has_handler, health_handler,
    hits_handler, increase_handler, set_handler, ttl_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `GET /has/:key` - Check whether a live entry exists
/// - `DELETE /del/:key` - Delete a key
/// - `DELETE /flush` - Delete every key
/// - `POST /incr/:key` - Increment an integer value
/// - `POST /decr/:key` - Decrement an integer value
/// - `GET /ttl/:key` - Remaining lifetime in seconds
/// - `GET /hits` - Visit counter
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/has/:key", get(has_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/flush", delete(flush_handler))
        .route("/incr/:key", post(increase_handler))
        .route("/decr/:key", post(decrease_handler))
        .route("/ttl/:key", get(ttl_handler))
        .route("/hits", get(hits_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
