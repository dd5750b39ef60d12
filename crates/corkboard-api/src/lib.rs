// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod dto;
pub mod errors;
pub mod params;
pub mod wire;

pub const CRATE_NAME: &str = "corkboard-api";

pub use errors::{ApiError, ApiErrorCode};
pub use params::PageParams;
pub use wire::ClientFrame;
