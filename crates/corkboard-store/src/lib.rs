// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Embedded entity store.
//!
//! Single-connection SQLite store holding the whole workspace hierarchy.
//! Authorization decisions never live here — callers resolve membership via
//! [`membership_role`](Store::membership_role) and decide with
//! `corkboard_core::authorize`. What does live here: the write-time
//! invariants (unique membership, unique pending invitation, creator-owner
//! atomicity, status+position single-row updates) that must hold no matter
//! which caller mutates.

use std::fmt;
use std::path::Path;

use rusqlite::Connection;

mod activities;
mod attachments;
mod comments;
mod invitations;
mod notifications;
mod projects;
mod rows;
mod schema;
mod tasks;
mod users;
mod workspaces;

pub const CRATE_NAME: &str = "corkboard-store";

pub use comments::CommentRecord;
pub use notifications::NotificationCounts;
pub use projects::{ProjectRecord, TaskStats};
pub use tasks::{TaskFilter, TaskRecord};
pub use workspaces::{MemberRecord, WorkspaceRecord};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// Referenced entity absent, including indirectly via the ownership
    /// chain.
    NotFound(&'static str),
    /// Uniqueness violation (duplicate membership, duplicate invitation).
    Conflict(String),
    /// A stored value failed to decode (corrupt enum tag, bad JSON column).
    Invalid(String),
    Sqlite(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid stored value: {msg}"),
            Self::Sqlite(msg) => write!(f, "sqlite error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("row"),
            rusqlite::Error::SqliteFailure(e, message)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => Self::Sqlite(err.to_string()),
        }
    }
}

/// Uniform pagination: `page` is 1-based, `limit` is clamped by the API
/// layer to 1..=100 before it gets here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    #[must_use]
    pub const fn offset(self) -> i64 {
        ((self.page.saturating_sub(1)) as i64) * (self.limit as i64)
    }

    #[must_use]
    pub const fn limit(self) -> i64 {
        self.limit as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
