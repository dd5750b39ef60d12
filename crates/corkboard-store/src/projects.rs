// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::{ProjectId, WorkspaceId};
use corkboard_model::{Project, TaskStatus, User};

use crate::rows::{project_from_row, status_at, user_at_offset};
use crate::{Page, Result, Store, StoreError};

const PROJECT_COLS: &str =
    "id, workspace_id, name, description, created_by, position, created_at, updated_at";

/// Per-status task counts rendered on project cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: u32,
    pub todo: u32,
    pub in_progress: u32,
    pub review: u32,
    pub done: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub project: Project,
    pub created_by: User,
    pub stats: TaskStats,
}

impl Store {
    pub fn create_project(&mut self, project: &Project) -> Result<()> {
        self.conn().execute(
            "INSERT INTO projects (id, workspace_id, name, description, created_by, position,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id.as_str(),
                project.workspace_id.as_str(),
                project.name,
                project.description,
                project.created_by.as_str(),
                project.position,
                project.created_at,
                project.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn project_by_id(&self, id: &ProjectId) -> Result<Option<Project>> {
        let found = self
            .conn()
            .prepare_cached(&format!("SELECT {PROJECT_COLS} FROM projects WHERE id = ?1"))?
            .query_row(params![id.as_str()], project_from_row)
            .optional()?;
        Ok(found)
    }

    /// Parent-chain hop used by the authorization path.
    pub fn project_workspace(&self, id: &ProjectId) -> Result<WorkspaceId> {
        self.conn()
            .prepare_cached("SELECT workspace_id FROM projects WHERE id = ?1")?
            .query_row(params![id.as_str()], |row| crate::rows::id_at(row, 0))
            .optional()?
            .ok_or(StoreError::NotFound("project"))
    }

    /// Projects of a workspace with creator and per-status task counts,
    /// newest first.
    pub fn projects_for_workspace(
        &self,
        workspace: &WorkspaceId,
        page: Page,
    ) -> Result<Vec<ProjectRecord>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT p.id, p.workspace_id, p.name, p.description, p.created_by, p.position,
                    p.created_at, p.updated_at,
                    u.id, u.email, u.display_name, u.avatar_url, u.created_at
             FROM projects p
             JOIN users u ON u.id = p.created_by
             WHERE p.workspace_id = ?1
             ORDER BY p.created_at DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let mut records = stmt
            .query_map(
                params![workspace.as_str(), page.limit(), page.offset()],
                |row| {
                    Ok(ProjectRecord {
                        project: project_from_row(row)?,
                        created_by: user_at_offset(row, 8)?,
                        stats: TaskStats::default(),
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for record in &mut records {
            record.stats = self.task_stats(&record.project.id)?;
        }
        Ok(records)
    }

    pub fn task_stats(&self, project: &ProjectId) -> Result<TaskStats> {
        let mut stmt = self
            .conn()
            .prepare_cached("SELECT status, COUNT(*) FROM tasks WHERE project_id = ?1 GROUP BY status")?;
        let counts = stmt
            .query_map(params![project.as_str()], |row| {
                Ok((status_at(row, 0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut stats = TaskStats::default();
        for (status, count) in counts {
            let count = count as u32;
            stats.total += count;
            match status {
                TaskStatus::Todo => stats.todo += count,
                TaskStatus::InProgress => stats.in_progress += count,
                TaskStatus::Review => stats.review += count,
                TaskStatus::Done => stats.done += count,
            }
        }
        Ok(stats)
    }
}
