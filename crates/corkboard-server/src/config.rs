// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 100.0,
            refill_per_sec: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    /// Shared secret for verifying bearer tokens; issuance lives outside
    /// this service.
    pub token_secret: String,
    pub token_ttl: Duration,
    pub upload_max_bytes: u64,
    pub upload_dir: PathBuf,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit_per_ip: RateLimitConfig,
    /// Pub/sub backplane for multi-instance room fan-out. Unset means the
    /// in-process fan-out is the backplane.
    pub redis_url: Option<String>,
    pub redis_prefix: String,
    /// Per-room broadcast buffer; a subscriber this far behind starts
    /// losing events and must refetch (which clients do anyway).
    pub room_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            database_path: PathBuf::from("corkboard.db"),
            token_secret: String::new(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            upload_max_bytes: 10 * 1024 * 1024,
            upload_dir: PathBuf::from("uploads"),
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            rate_limit_per_ip: RateLimitConfig::default(),
            redis_url: None,
            redis_prefix: "corkboard".to_string(),
            room_buffer: 256,
        }
    }
}
