//! API Handlers
//!
//! HTTP request handlers exposing the store contract. Store calls block,
//! so each one runs on tokio's blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{self, Store};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, AdjustRequest, GetResponse, HasResponse, HealthResponse, MessageResponse,
    SetRequest, TtlResponse,
};

/// Key used by the visit counter endpoint
pub const HITS_KEY: &str = "hits";

/// Application state shared across all handlers.
///
/// Holds the single store selected at startup; every request sees the same
/// instance.
#[derive(Clone)]
pub struct AppState {
    /// The configured backend
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Creates a new AppState around an existing store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Opens the backend named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(cache::open(&config.cache_options())?))
    }

    /// Runs a blocking store operation off the async executor.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| CacheError::Backend(format!("Store task failed: {}", e)))?
    }
}

fn checked_key(key: String) -> Result<String> {
    match validate_key(&key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(key),
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with optional TTL in seconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    let SetRequest { key, value, .. } = req;
    let stored_key = key.clone();
    state
        .run(move |store| store.set(&stored_key, &value, ttl))
        .await?;

    Ok(Json(MessageResponse::set(key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let key = checked_key(key)?;
    let lookup = key.clone();
    let value = state.run(move |store| store.get(&lookup)).await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<HasResponse>> {
    let key = checked_key(key)?;
    let lookup = key.clone();
    let exists = state.run(move |store| store.has(&lookup)).await?;

    Ok(Json(HasResponse::new(key, exists)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    let key = checked_key(key)?;
    let target = key.clone();
    state.run(move |store| store.delete(&target)).await?;

    Ok(Json(MessageResponse::deleted(key)))
}

/// Handler for DELETE /flush
pub async fn flush_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.run(|store| store.delete_all()).await?;

    Ok(Json(MessageResponse::flushed()))
}

/// Handler for POST /incr/:key
pub async fn increase_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<MessageResponse>> {
    let key = checked_key(key)?;
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let target = key.clone();
    state
        .run(move |store| store.increase(&target, req.by))
        .await?;

    Ok(Json(MessageResponse::increased(key)))
}

/// Handler for POST /decr/:key
pub async fn decrease_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<MessageResponse>> {
    let key = checked_key(key)?;
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let target = key.clone();
    state
        .run(move |store| store.decrease(&target, req.by))
        .await?;

    Ok(Json(MessageResponse::decreased(key)))
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let key = checked_key(key)?;
    let lookup = key.clone();
    let remaining = state.run(move |store| store.ttl(&lookup)).await?;

    Ok(Json(TtlResponse::new(key, remaining)))
}

/// Handler for GET /hits
///
/// Visit counter: starts the `hits` key at "0", then increments it on
/// every later request.
pub async fn hits_handler(State(state): State<AppState>) -> Result<Json<GetResponse>> {
    let value = state
        .run(|store| {
            if store.has(HITS_KEY)? {
                store.increase(HITS_KEY, 1)?;
            } else {
                store.set(HITS_KEY, "0", None)?;
            }
            store.get(HITS_KEY)
        })
        .await?;

    Ok(Json(GetResponse::new(HITS_KEY, value)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.store.name()))
}
