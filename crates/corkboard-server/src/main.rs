// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use corkboard_server::realtime::backplane::RedisBroadcaster;
use corkboard_server::{build_router, AppState, RateLimitConfig, ServerConfig};
use corkboard_store::Store;

fn env_str(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_list(name: &str, default: &str) -> Vec<String> {
    env_str(name, default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn config_from_env() -> ServerConfig {
    ServerConfig {
        bind_addr: env_str("BIND_ADDR", "127.0.0.1:5000"),
        database_path: PathBuf::from(env_str("DATABASE_PATH", "corkboard.db")),
        token_secret: env_str("TOKEN_SECRET", ""),
        token_ttl: Duration::from_secs(env_u64("TOKEN_TTL_SECS", 24 * 60 * 60)),
        upload_max_bytes: env_u64("UPLOAD_MAX_BYTES", 10 * 1024 * 1024),
        upload_dir: PathBuf::from(env_str("UPLOAD_DIR", "uploads")),
        cors_allowed_origins: env_list("CORS_ALLOWED_ORIGINS", "http://localhost:3000"),
        rate_limit_per_ip: RateLimitConfig {
            capacity: env_f64("RATE_LIMIT_CAPACITY", 100.0),
            refill_per_sec: env_f64("RATE_LIMIT_REFILL_PER_SEC", 10.0),
        },
        redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
        redis_prefix: env_str("REDIS_PREFIX", "corkboard"),
        room_buffer: env_usize("ROOM_BUFFER", 256),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config_from_env();
    if config.token_secret.is_empty() {
        error!("TOKEN_SECRET must be set");
        std::process::exit(2);
    }

    let store = match Store::open(&config.database_path) {
        Ok(store) => store,
        Err(err) => {
            error!(path = %config.database_path.display(), error = %err, "failed to open store");
            std::process::exit(2);
        }
    };

    let state = match &config.redis_url {
        Some(url) => {
            let rooms = Arc::new(corkboard_server::realtime::Rooms::new(config.room_buffer));
            match RedisBroadcaster::connect(url, &config.redis_prefix, Arc::clone(&rooms)).await {
                Ok(broadcaster) => AppState::with_broadcaster(
                    store,
                    config.clone(),
                    rooms,
                    Arc::new(broadcaster),
                ),
                Err(err) => {
                    error!(error = %err, "redis backplane unavailable, falling back to local fan-out");
                    AppState::new(store, config.clone())
                }
            }
        }
        None => AppState::new(store, config.clone()),
    };

    let router = build_router(state);
    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %config.bind_addr, error = %err, "failed to bind");
            std::process::exit(2);
        }
    };
    info!(addr = %config.bind_addr, "corkboard server listening");
    if let Err(err) = axum::serve(listener, router).await {
        error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}
