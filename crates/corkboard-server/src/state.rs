// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::error;

use corkboard_api::ApiError;
use corkboard_store::Store;

use crate::config::ServerConfig;
use crate::rate_limiter::RateLimiter;
use crate::realtime::{Broadcaster, LocalBroadcaster, Rooms};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    /// Explicit broadcast capability — everything that emits events
    /// (handlers, activity log, notifications) goes through this, never a
    /// process-wide socket handle.
    pub broadcaster: Arc<dyn Broadcaster>,
    pub rooms: Arc<Rooms>,
    pub config: Arc<ServerConfig>,
    pub ip_limiter: Arc<RateLimiter>,
    pub request_seq: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl AppState {
    /// Single-process state: the in-process room fan-out is the backplane.
    #[must_use]
    pub fn new(store: Store, config: ServerConfig) -> Self {
        let rooms = Arc::new(Rooms::new(config.room_buffer));
        let broadcaster: Arc<dyn Broadcaster> =
            Arc::new(LocalBroadcaster::new(Arc::clone(&rooms)));
        Self::with_broadcaster(store, config, rooms, broadcaster)
    }

    #[must_use]
    pub fn with_broadcaster(
        store: Store,
        config: ServerConfig,
        rooms: Arc<Rooms>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            broadcaster,
            rooms,
            config: Arc::new(config),
            ip_limiter: Arc::new(RateLimiter::default()),
            request_seq: Arc::new(AtomicU64::new(1)),
            started_at: Instant::now(),
        }
    }

    /// Log the real failure, hand the client an opaque 500.
    pub fn internal_error(&self, context: &str, err: &dyn std::fmt::Display) -> ApiError {
        error!(context, error = %err, "internal error");
        ApiError::internal()
    }
}
