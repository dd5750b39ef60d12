// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::{AttachmentId, TaskId};
use corkboard_model::Attachment;

use crate::rows::attachment_from_row;
use crate::{Result, Store, StoreError};

const ATTACHMENT_COLS: &str =
    "id, task_id, filename, storage_key, size_bytes, mime_type, uploaded_by, created_at";

impl Store {
    pub fn create_attachment(&mut self, attachment: &Attachment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO attachments (id, task_id, filename, storage_key, size_bytes, mime_type,
                                      uploaded_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                attachment.id.as_str(),
                attachment.task_id.as_str(),
                attachment.filename,
                attachment.storage_key,
                attachment.size_bytes,
                attachment.mime_type,
                attachment.uploaded_by.as_str(),
                attachment.created_at
            ],
        )?;
        Ok(())
    }

    pub fn attachment_by_id(&self, id: &AttachmentId) -> Result<Option<Attachment>> {
        let found = self
            .conn()
            .prepare_cached(&format!(
                "SELECT {ATTACHMENT_COLS} FROM attachments WHERE id = ?1"
            ))?
            .query_row(params![id.as_str()], attachment_from_row)
            .optional()?;
        Ok(found)
    }

    pub fn attachments_for_task(&self, task: &TaskId) -> Result<Vec<Attachment>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {ATTACHMENT_COLS} FROM attachments
             WHERE task_id = ?1 ORDER BY created_at ASC"
        ))?;
        let attachments = stmt
            .query_map(params![task.as_str()], attachment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attachments)
    }

    pub fn delete_attachment(&mut self, id: &AttachmentId) -> Result<()> {
        let removed = self.conn().execute(
            "DELETE FROM attachments WHERE id = ?1",
            params![id.as_str()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound("attachment"));
        }
        Ok(())
    }
}
