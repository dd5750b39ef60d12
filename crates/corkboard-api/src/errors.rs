// SPDX-License-Identifier: Apache-2.0

//! The HTTP error envelope.
//!
//! Wire shape is `{"error": "<message>", "details": [...]}` with the class
//! carried by the status code: 400 validation, 401 unauthenticated, 403
//! unauthorized, 404 not found, 409 conflict, 413 payload too large, 500
//! unexpected. Messages are stable and machine-readable; internals never
//! leak into 500 bodies.

use serde_json::{json, Value};

use corkboard_core::Denied;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ApiErrorCode {
    Validation,
    Unauthenticated,
    Unauthorized,
    NotFound,
    Conflict,
    PayloadTooLarge,
    Internal,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthenticated => 401,
            Self::Unauthorized => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::PayloadTooLarge => 413,
            Self::Internal => 500,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthenticated => "unauthenticated",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Validation, message)
    }

    #[must_use]
    pub fn validation_failed(field_errors: Value) -> Self {
        Self::validation("Validation failed").with_details(field_errors)
    }

    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Unauthenticated, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Unauthorized, message)
    }

    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{entity} not found"))
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Conflict, message)
    }

    #[must_use]
    pub fn payload_too_large(limit_bytes: u64) -> Self {
        Self::new(ApiErrorCode::PayloadTooLarge, "File too large")
            .with_details(json!([{ "limit_bytes": limit_bytes }]))
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(ApiErrorCode::Internal, "Internal server error")
    }

    /// Response body for the envelope.
    #[must_use]
    pub fn body(&self) -> Value {
        match &self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<Denied> for ApiError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::NotAMember => Self::unauthorized("Access denied to workspace"),
            Denied::InsufficientRole { .. } => Self::unauthorized("Insufficient permissions"),
            Denied::SelfRemoval => {
                Self::validation("Cannot remove yourself; leave the workspace instead")
            }
            _ => Self::unauthorized("Access denied"),
        }
    }
}
