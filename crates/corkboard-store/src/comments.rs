// SPDX-License-Identifier: Apache-2.0

use rusqlite::params;

use corkboard_core::{CommentId, TaskId, UserId};
use corkboard_model::{Comment, User};

use crate::rows::{comment_from_row, user_at_offset, user_from_row};
use crate::{Page, Result, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub comment: Comment,
    pub author: User,
    pub mentions: Vec<User>,
}

impl Store {
    pub fn create_comment(&mut self, comment: &Comment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO comments (id, task_id, author_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.as_str(),
                comment.task_id.as_str(),
                comment.author_id.as_str(),
                comment.content,
                comment.created_at
            ],
        )?;
        Ok(())
    }

    /// Record a validated mention. Callers have already resolved the
    /// candidate to a member of the task's workspace; unresolved candidates
    /// never reach this method.
    pub fn insert_mention(&mut self, comment: &CommentId, mentioned: &UserId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO comment_mentions (comment_id, mentioned_user_id)
             VALUES (?1, ?2)",
            params![comment.as_str(), mentioned.as_str()],
        )?;
        Ok(())
    }

    pub fn mentions_for_comment(&self, comment: &CommentId) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT u.id, u.email, u.display_name, u.avatar_url, u.created_at
             FROM comment_mentions m JOIN users u ON u.id = m.mentioned_user_id
             WHERE m.comment_id = ?1 ORDER BY u.display_name ASC",
        )?;
        let users = stmt
            .query_map(params![comment.as_str()], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Oldest first, the reading order of a thread.
    pub fn comments_for_task(&self, task: &TaskId, page: Page) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT c.id, c.task_id, c.author_id, c.content, c.created_at,
                    u.id, u.email, u.display_name, u.avatar_url, u.created_at
             FROM comments c JOIN users u ON u.id = c.author_id
             WHERE c.task_id = ?1
             ORDER BY c.created_at ASC, c.id ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![task.as_str(), page.limit(), page.offset()], |row| {
                Ok((comment_from_row(row)?, user_at_offset(row, 5)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(comment, author)| {
                let mentions = self.mentions_for_comment(&comment.id)?;
                Ok(CommentRecord {
                    comment,
                    author,
                    mentions,
                })
            })
            .collect()
    }
}
