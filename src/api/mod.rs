//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set`, `GET /get/:key`, `GET /has/:key`, `DELETE /del/:key`
//! - `DELETE /flush`
//! - `POST /incr/:key`, `POST /decr/:key`
//! - `GET /ttl/:key`
//! - `GET /hits` - Visit counter
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
