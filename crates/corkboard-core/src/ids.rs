// SPDX-License-Identifier: Apache-2.0

//! Typed entity identifiers.
//!
//! Every persisted entity is addressed by a UUIDv4 string wrapped in its own
//! newtype, so a task id cannot be passed where a workspace id is expected.
//! `parse` validates the UUID shape at the boundary; `mint` produces a fresh
//! id for inserts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct IdError {
    pub kind: &'static str,
    pub value: String,
}

impl IdError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for IdError {}

macro_rules! entity_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if uuid::Uuid::parse_str(&value).is_err() {
                    return Err(IdError::new($kind, &value));
                }
                Ok(Self(value))
            }

            /// Mint a fresh v4 id.
            #[must_use]
            pub fn mint() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

entity_id!(UserId, "user_id");
entity_id!(WorkspaceId, "workspace_id");
entity_id!(InvitationId, "invitation_id");
entity_id!(ProjectId, "project_id");
entity_id!(TaskId, "task_id");
entity_id!(CommentId, "comment_id");
entity_id!(AttachmentId, "attachment_id");
entity_id!(NotificationId, "notification_id");
entity_id!(ActivityId, "activity_id");
