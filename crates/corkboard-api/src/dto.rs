// SPDX-License-Identifier: Apache-2.0

//! Request bodies and denormalized response shapes.
//!
//! Responses flatten the entity and attach the author/context fields a
//! client renders without follow-up fetches, mirroring what the board and
//! workspace pages consume.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use corkboard_core::{ProjectId, Role, TaskId, UserId, WorkspaceId};
use corkboard_model::{
    Comment, Project, Task, TaskPriority, TaskStatus, User, Workspace, WorkspaceInvitation,
};

use crate::errors::ApiError;

fn field_error(field: &str, reason: &str) -> Value {
    json!({ "field": field, "reason": reason })
}

fn check_len(
    errors: &mut Vec<Value>,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    reason: &str,
) {
    let len = value.trim().len();
    if len < min || len > max {
        errors.push(field_error(field, reason));
    }
}

fn finish_validation(errors: Vec<Value>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_failed(Value::Array(errors)))
    }
}

// ---------------------------------------------------------------------------
// Request bodies

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl WorkspaceBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_len(&mut errors, "name", &self.name, 1, 100, "Name must be 1-100 characters");
        if let Some(description) = &self.description {
            check_len(
                &mut errors,
                "description",
                description,
                0,
                500,
                "Description must be under 500 characters",
            );
        }
        finish_validation(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInvitationBody {
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl CreateInvitationBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if !self.email.contains('@') || self.email.trim() != self.email {
            errors.push(field_error("email", "Valid email required"));
        }
        if self.role == Some(Role::Owner) {
            errors.push(field_error("role", "Cannot invite as owner"));
        }
        finish_validation(errors)
    }

    #[must_use]
    pub fn proposed_role(&self) -> Role {
        self.role.unwrap_or(Role::Member)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub workspace_id: WorkspaceId,
}

impl CreateProjectBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_len(&mut errors, "name", &self.name, 1, 100, "Name must be 1-100 characters");
        if let Some(description) = &self.description {
            check_len(
                &mut errors,
                "description",
                description,
                0,
                1000,
                "Description must be under 1000 characters",
            );
        }
        finish_validation(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<i64>,
    pub project_id: ProjectId,
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
}

impl CreateTaskBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_len(&mut errors, "title", &self.title, 1, 200, "Title must be 1-200 characters");
        if let Some(description) = &self.description {
            check_len(
                &mut errors,
                "description",
                description,
                0,
                2000,
                "Description must be under 2000 characters",
            );
        }
        finish_validation(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<i64>,
}

impl UpdateTaskBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_len(&mut errors, "title", &self.title, 1, 200, "Title must be 1-200 characters");
        if let Some(description) = &self.description {
            check_len(
                &mut errors,
                "description",
                description,
                0,
                2000,
                "Description must be under 2000 characters",
            );
        }
        finish_validation(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskStatusBody {
    pub status: TaskStatus,
}

/// Drag-end persistence: status and position always travel together so the
/// store can write them in one update.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskPositionBody {
    pub status: TaskStatus,
    pub position: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentBody {
    pub content: String,
    pub task_id: TaskId,
}

impl CreateCommentBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_len(
            &mut errors,
            "content",
            &self.content,
            1,
            2000,
            "Comment must be 1-2000 characters",
        );
        finish_validation(errors)
    }
}

// ---------------------------------------------------------------------------
// Response shapes

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceSummary {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub user_role: Role,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub user: User,
    pub role: Role,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceDetail {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub members: Vec<MemberView>,
    pub projects: Vec<Project>,
    pub user_role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStatsView {
    pub total: u32,
    pub todo: u32,
    pub in_progress: u32,
    pub review: u32,
    pub done: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub created_by: User,
    pub task_stats: TaskStatsView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub created_by: User,
    pub assignees: Vec<User>,
    pub comment_count: u32,
    pub attachment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
    pub mentions: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationView {
    #[serde(flatten)]
    pub invitation: WorkspaceInvitation,
    pub invited_by_user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_body_enforces_lengths() {
        let ok = WorkspaceBody {
            name: "Research".to_string(),
            description: Some("Long-running ideas".to_string()),
        };
        assert!(ok.validate().is_ok());

        let empty = WorkspaceBody {
            name: "   ".to_string(),
            description: None,
        };
        let err = empty.validate().expect_err("blank name rejected");
        assert_eq!(err.code, crate::ApiErrorCode::Validation);

        let long = WorkspaceBody {
            name: "x".repeat(101),
            description: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn invitation_body_rejects_owner_proposals_and_bad_emails() {
        let bad_email = CreateInvitationBody {
            email: "not-an-email".to_string(),
            role: None,
        };
        assert!(bad_email.validate().is_err());

        let owner = CreateInvitationBody {
            email: "a@b.c".to_string(),
            role: Some(Role::Owner),
        };
        assert!(owner.validate().is_err());

        let defaulted = CreateInvitationBody {
            email: "a@b.c".to_string(),
            role: None,
        };
        assert!(defaulted.validate().is_ok());
        assert_eq!(defaulted.proposed_role(), Role::Member);
    }

    #[test]
    fn task_body_collects_field_errors() {
        let body = CreateTaskBody {
            title: String::new(),
            description: Some("d".repeat(2001)),
            priority: None,
            status: None,
            due_date: None,
            project_id: ProjectId::mint(),
            assignee_ids: Vec::new(),
        };
        let err = body.validate().expect_err("invalid body");
        let details = err.details.expect("details");
        assert_eq!(details.as_array().map(Vec::len), Some(2));
    }
}
