// SPDX-License-Identifier: Apache-2.0

//! Room-based event fan-out.
//!
//! One room per workspace, project, task and user, plus a process-wide
//! presence room every connection joins. Joins are authorized against fresh
//! membership reads and denied silently; events inside one room reach every
//! subscriber in emit order; nothing is replayed after a reconnect.
//!
//! Publication goes through the [`Broadcaster`] capability. In a single
//! process that is [`LocalBroadcaster`] writing straight into [`Rooms`];
//! with a Redis backplane configured it is
//! [`backplane::RedisBroadcaster`], which publishes to Redis while a relay
//! task feeds every instance's local rooms from the subscription — so rooms
//! span processes without the emitters knowing.

pub mod backplane;
mod rooms;
mod socket;

use async_trait::async_trait;

use corkboard_core::{ProjectId, TaskId, UserId, WorkspaceId};
use corkboard_model::ServerEvent;

pub use rooms::Rooms;
pub use socket::ws_handler;

/// A broadcast scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    Workspace(WorkspaceId),
    Project(ProjectId),
    Task(TaskId),
    User(UserId),
    /// Process-wide presence signals (online/offline).
    Presence,
}

impl RoomId {
    /// Channel name, also the backplane topic suffix.
    #[must_use]
    pub fn channel(&self) -> String {
        match self {
            Self::Workspace(id) => format!("workspace_{id}"),
            Self::Project(id) => format!("project_{id}"),
            Self::Task(id) => format!("task_{id}"),
            Self::User(id) => format!("user_{id}"),
            Self::Presence => "presence".to_string(),
        }
    }
}

/// The injected emit capability.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(&self, room: &RoomId, event: &ServerEvent);
}

/// Straight into the local rooms; the fan-out for a single-process
/// deployment.
pub struct LocalBroadcaster {
    rooms: std::sync::Arc<Rooms>,
}

impl LocalBroadcaster {
    #[must_use]
    pub fn new(rooms: std::sync::Arc<Rooms>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl Broadcaster for LocalBroadcaster {
    async fn publish(&self, room: &RoomId, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(frame) => {
                self.rooms.send(&room.channel(), frame.into());
            }
            Err(err) => {
                tracing::warn!(event = event.name(), error = %err, "failed to encode event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_match_the_room_convention() {
        let ws = WorkspaceId::mint();
        assert_eq!(RoomId::Workspace(ws.clone()).channel(), format!("workspace_{ws}"));
        let user = UserId::mint();
        assert_eq!(RoomId::User(user.clone()).channel(), format!("user_{user}"));
        assert_eq!(RoomId::Presence.channel(), "presence");
    }
}
