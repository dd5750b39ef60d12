// SPDX-License-Identifier: Apache-2.0

//! Client-to-server realtime frames.
//!
//! Wire shape is `{"action": "<name>", ...fields}`. Joins are requests, not
//! grants: the server re-validates membership before admitting a connection
//! to a room and stays silent on denial. `task_moved`, typing and presence
//! frames are best-effort UX signals — never persisted, never authoritative.

use serde::{Deserialize, Serialize};

use corkboard_core::{ProjectId, TaskId, WorkspaceId};
use corkboard_model::TaskStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    JoinWorkspace { id: WorkspaceId },
    JoinProject { id: ProjectId },
    JoinTask { id: TaskId },
    LeaveWorkspace { id: WorkspaceId },
    LeaveProject { id: ProjectId },
    LeaveTask { id: TaskId },
    /// Peer relay of a drag result, emitted ahead of the authoritative
    /// persistence call for latency hiding.
    TaskMoved {
        task_id: TaskId,
        project_id: ProjectId,
        status: TaskStatus,
        position: f64,
    },
    TypingStart { task_id: TaskId },
    TypingStop { task_id: TaskId },
    UserActive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_parse_from_tagged_json() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"action":"join_project","id":"8d8ac610-566d-4ef0-9c22-186b2a5ed793"}"#)
                .expect("parse");
        assert!(matches!(frame, ClientFrame::JoinProject { .. }));

        let frame: ClientFrame = serde_json::from_str(r#"{"action":"user_active"}"#).expect("parse");
        assert_eq!(frame, ClientFrame::UserActive);
    }

    #[test]
    fn task_moved_round_trips() {
        let frame = ClientFrame::TaskMoved {
            task_id: TaskId::mint(),
            project_id: ProjectId::mint(),
            status: TaskStatus::Review,
            position: 512.0,
        };
        let json = serde_json::to_string(&frame).expect("serialize");
        assert_eq!(
            serde_json::from_str::<ClientFrame>(&json).expect("parse"),
            frame
        );
    }

    #[test]
    fn unknown_actions_are_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"action":"drop_tables"}"#).is_err());
    }
}
