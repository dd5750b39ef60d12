// SPDX-License-Identifier: Apache-2.0

use rusqlite::params;

use corkboard_core::WorkspaceId;
use corkboard_model::Activity;

use crate::rows::activity_from_row;
use crate::{Page, Result, Store};

const ACTIVITY_COLS: &str =
    "id, workspace_id, project_id, task_id, user_id, action, details, created_at";

impl Store {
    pub fn insert_activity(&mut self, activity: &Activity) -> Result<()> {
        self.conn().execute(
            "INSERT INTO activities (id, workspace_id, project_id, task_id, user_id, action,
                                     details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                activity.id.as_str(),
                activity.workspace_id.as_str(),
                activity.project_id.as_ref().map(|id| id.as_str()),
                activity.task_id.as_ref().map(|id| id.as_str()),
                activity.user_id.as_str(),
                activity.action,
                activity.details.to_string(),
                activity.created_at
            ],
        )?;
        Ok(())
    }

    /// Newest first; optional exact action filter.
    pub fn activities_for_workspace(
        &self,
        workspace: &WorkspaceId,
        action_filter: Option<&str>,
        page: Page,
    ) -> Result<Vec<Activity>> {
        let sql = if action_filter.is_some() {
            format!(
                "SELECT {ACTIVITY_COLS} FROM activities
                 WHERE workspace_id = ?1 AND action = ?4
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            )
        } else {
            format!(
                "SELECT {ACTIVITY_COLS} FROM activities
                 WHERE workspace_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            )
        };
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let activities = match action_filter {
            Some(action) => stmt
                .query_map(
                    params![workspace.as_str(), page.limit(), page.offset(), action],
                    activity_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(
                    params![workspace.as_str(), page.limit(), page.offset()],
                    activity_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(activities)
    }
}

#[cfg(test)]
mod tests {
    use corkboard_core::ActivityId;
    use corkboard_model::Activity;

    use crate::{testutil, Page};

    #[test]
    fn activities_list_newest_first_with_action_filter() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        for (action, at) in [("workspace_created", 1_000), ("task_created", 2_000)] {
            store
                .insert_activity(&Activity {
                    id: ActivityId::mint(),
                    workspace_id: ws.id.clone(),
                    project_id: None,
                    task_id: None,
                    user_id: ada.id.clone(),
                    action: action.to_string(),
                    details: serde_json::json!({}),
                    created_at: at,
                })
                .expect("insert");
        }

        let all = store
            .activities_for_workspace(&ws.id, None, Page::default())
            .expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].action, "task_created");

        let filtered = store
            .activities_for_workspace(&ws.id, Some("workspace_created"), Page::default())
            .expect("filtered");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].action, "workspace_created");
    }
}
