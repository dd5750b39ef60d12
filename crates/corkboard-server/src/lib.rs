// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! The corkboard server: HTTP CRUD surface plus the room-based realtime
//! broadcast layer, over the embedded store.
//!
//! Every mutation follows the same path: authenticate the bearer identity,
//! resolve the owning workspace through the entity's parent chain, pass the
//! freshly-read membership through the authority check, write, then fan the
//! event out to the relevant rooms. Activity and notification writes are
//! best-effort and never block the primary mutation.

pub mod auth;
pub mod config;
pub mod http;
pub mod middleware;
pub mod rate_limiter;
pub mod realtime;
pub mod services;
pub mod state;

pub const CRATE_NAME: &str = "corkboard-server";

pub use config::{RateLimitConfig, ServerConfig};
pub use http::build_router;
pub use state::AppState;
