// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::{ProjectId, TaskId, UserId, WorkspaceId};
use corkboard_model::{Task, TaskPriority, TaskStatus, User};

use crate::rows::{task_from_row, user_from_row};
use crate::{Page, Result, Store, StoreError};

const TASK_COLS: &str = "id, project_id, title, description, priority, status, due_date, \
                         created_by, position, created_at, updated_at";

/// Optional column filters for board fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// A task denormalized for rendering: creator, assignees and child counts.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub task: Task,
    pub created_by: User,
    pub assignees: Vec<User>,
    pub comment_count: u32,
    pub attachment_count: u32,
}

impl Store {
    /// Insert the task and its initial assignments in one transaction.
    pub fn create_task(&mut self, task: &Task, assignee_ids: &[UserId]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO tasks (id, project_id, title, description, priority, status, due_date,
                                created_by, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                task.id.as_str(),
                task.project_id.as_str(),
                task.title,
                task.description,
                task.priority.as_str(),
                task.status.as_str(),
                task.due_date,
                task.created_by.as_str(),
                task.position,
                task.created_at,
                task.updated_at
            ],
        )?;
        for user_id in assignee_ids {
            tx.execute(
                "INSERT OR IGNORE INTO task_assignments (task_id, user_id, assigned_by, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    task.id.as_str(),
                    user_id.as_str(),
                    task.created_by.as_str(),
                    task.created_at
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn task_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let found = self
            .conn()
            .prepare_cached(&format!("SELECT {TASK_COLS} FROM tasks WHERE id = ?1"))?
            .query_row(params![id.as_str()], task_from_row)
            .optional()?;
        Ok(found)
    }

    /// Parent chain for the authorization path: task → project → workspace.
    pub fn task_workspace(&self, id: &TaskId) -> Result<(ProjectId, WorkspaceId)> {
        self.conn()
            .prepare_cached(
                "SELECT t.project_id, p.workspace_id
                 FROM tasks t JOIN projects p ON p.id = t.project_id
                 WHERE t.id = ?1",
            )?
            .query_row(params![id.as_str()], |row| {
                Ok((crate::rows::id_at(row, 0)?, crate::rows::id_at(row, 1)?))
            })
            .optional()?
            .ok_or(StoreError::NotFound("task"))
    }

    /// Board fetch: tasks of a project in `(status, position)` render order,
    /// denormalized with creator, assignees and child counts.
    pub fn tasks_for_project(
        &self,
        project: &ProjectId,
        filter: TaskFilter,
        page: Page,
    ) -> Result<Vec<TaskRecord>> {
        let mut sql = format!(
            "SELECT {TASK_COLS} FROM tasks WHERE project_id = ?1"
        );
        if filter.status.is_some() {
            sql.push_str(" AND status = ?4");
        }
        if filter.priority.is_some() {
            sql.push_str(if filter.status.is_some() {
                " AND priority = ?5"
            } else {
                " AND priority = ?4"
            });
        }
        // Column order on the board, then the sparse position scalar; ids
        // break exact-position ties stably.
        sql.push_str(
            " ORDER BY CASE status
                WHEN 'todo' THEN 0 WHEN 'in_progress' THEN 1
                WHEN 'review' THEN 2 ELSE 3 END,
              position ASC, id ASC
              LIMIT ?2 OFFSET ?3",
        );

        let mut stmt = self.conn().prepare_cached(&sql)?;
        let tasks = match (filter.status, filter.priority) {
            (Some(status), Some(priority)) => stmt
                .query_map(
                    params![
                        project.as_str(),
                        page.limit(),
                        page.offset(),
                        status.as_str(),
                        priority.as_str()
                    ],
                    task_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            (Some(status), None) => stmt
                .query_map(
                    params![project.as_str(), page.limit(), page.offset(), status.as_str()],
                    task_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            (None, Some(priority)) => stmt
                .query_map(
                    params![
                        project.as_str(),
                        page.limit(),
                        page.offset(),
                        priority.as_str()
                    ],
                    task_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            (None, None) => stmt
                .query_map(
                    params![project.as_str(), page.limit(), page.offset()],
                    task_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        tasks.into_iter().map(|task| self.denormalize(task)).collect()
    }

    fn denormalize(&self, task: Task) -> Result<TaskRecord> {
        let created_by = self
            .user_by_id(&task.created_by)?
            .ok_or(StoreError::NotFound("user"))?;
        let assignees = self.assignees_for_task(&task.id)?;
        let comment_count: i64 = self
            .conn()
            .prepare_cached("SELECT COUNT(*) FROM comments WHERE task_id = ?1")?
            .query_row(params![task.id.as_str()], |row| row.get(0))?;
        let attachment_count: i64 = self
            .conn()
            .prepare_cached("SELECT COUNT(*) FROM attachments WHERE task_id = ?1")?
            .query_row(params![task.id.as_str()], |row| row.get(0))?;
        Ok(TaskRecord {
            task,
            created_by,
            assignees,
            comment_count: comment_count as u32,
            attachment_count: attachment_count as u32,
        })
    }

    pub fn task_record(&self, id: &TaskId) -> Result<Option<TaskRecord>> {
        match self.task_by_id(id)? {
            Some(task) => Ok(Some(self.denormalize(task)?)),
            None => Ok(None),
        }
    }

    pub fn assignees_for_task(&self, task: &TaskId) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT u.id, u.email, u.display_name, u.avatar_url, u.created_at
             FROM task_assignments a JOIN users u ON u.id = a.user_id
             WHERE a.task_id = ?1 ORDER BY a.assigned_at ASC",
        )?;
        let users = stmt
            .query_map(params![task.as_str()], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn update_task(
        &mut self,
        id: &TaskId,
        title: &str,
        description: Option<&str>,
        priority: TaskPriority,
        due_date: Option<i64>,
        now_ms: i64,
    ) -> Result<Task> {
        let changed = self.conn().execute(
            "UPDATE tasks SET title = ?2, description = ?3, priority = ?4, due_date = ?5,
                              updated_at = ?6
             WHERE id = ?1",
            params![id.as_str(), title, description, priority.as_str(), due_date, now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("task"));
        }
        self.task_by_id(id)?.ok_or(StoreError::NotFound("task"))
    }

    pub fn update_task_status(
        &mut self,
        id: &TaskId,
        status: TaskStatus,
        now_ms: i64,
    ) -> Result<Task> {
        let changed = self.conn().execute(
            "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.as_str(), status.as_str(), now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("task"));
        }
        self.task_by_id(id)?.ok_or(StoreError::NotFound("task"))
    }

    /// The reorder write: status and position land in the same row update,
    /// so no read can observe a task in its old column with its new
    /// position. Nothing else is written — sibling positions are sparse and
    /// stay untouched. Concurrent calls for the same task resolve
    /// last-write-wins.
    pub fn update_task_position(
        &mut self,
        id: &TaskId,
        status: TaskStatus,
        position: f64,
        now_ms: i64,
    ) -> Result<Task> {
        let changed = self.conn().execute(
            "UPDATE tasks SET status = ?2, position = ?3, updated_at = ?4 WHERE id = ?1",
            params![id.as_str(), status.as_str(), position, now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("task"));
        }
        self.task_by_id(id)?.ok_or(StoreError::NotFound("task"))
    }

    pub fn delete_task(&mut self, id: &TaskId) -> Result<()> {
        let removed = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
        if removed == 0 {
            return Err(StoreError::NotFound("task"));
        }
        Ok(())
    }
}
