// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::UserId;
use corkboard_model::User;

use crate::rows::user_from_row;
use crate::{Result, Store};

const USER_COLS: &str = "id, email, display_name, avatar_url, created_at";

impl Store {
    /// Insert-or-refresh the identity row. Called on every authenticated
    /// request with claims from a verified token, so the first request a
    /// user ever makes provisions them; later requests keep profile fields
    /// current. The id is immutable; email is the upsert conflict target
    /// for tokens re-issued with a fresh subject.
    pub fn upsert_user(&mut self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, email, display_name, avatar_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
               email = excluded.email,
               display_name = excluded.display_name,
               avatar_url = excluded.avatar_url",
            params![
                user.id.as_str(),
                user.email,
                user.display_name,
                user.avatar_url,
                user.created_at
            ],
        )?;
        Ok(())
    }

    pub fn user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let found = self
            .conn()
            .prepare_cached(&format!("SELECT {USER_COLS} FROM users WHERE id = ?1"))?
            .query_row(params![id.as_str()], user_from_row)
            .optional()?;
        Ok(found)
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let found = self
            .conn()
            .prepare_cached(&format!("SELECT {USER_COLS} FROM users WHERE email = ?1"))?
            .query_row(params![email], user_from_row)
            .optional()?;
        Ok(found)
    }

    /// Mention-candidate resolution: exact display-name match.
    pub fn user_by_display_name(&self, display_name: &str) -> Result<Option<User>> {
        let found = self
            .conn()
            .prepare_cached(&format!(
                "SELECT {USER_COLS} FROM users WHERE display_name = ?1 LIMIT 1"
            ))?
            .query_row(params![display_name], user_from_row)
            .optional()?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil;

    #[test]
    fn upsert_provisions_then_refreshes_profile() {
        let mut store = testutil::store();
        let mut user = testutil::user(&mut store, "ada@example.com", "ada");

        user.display_name = "Ada L".to_string();
        store.upsert_user(&user).expect("refresh");

        let loaded = store
            .user_by_id(&user.id)
            .expect("query")
            .expect("user exists");
        assert_eq!(loaded.display_name, "Ada L");
        assert_eq!(loaded.email, "ada@example.com");
    }

    #[test]
    fn lookup_by_email_and_display_name() {
        let mut store = testutil::store();
        let user = testutil::user(&mut store, "bob@example.com", "bob");

        assert_eq!(
            store.user_by_email("bob@example.com").expect("query"),
            Some(user.clone())
        );
        assert_eq!(
            store.user_by_display_name("bob").expect("query"),
            Some(user)
        );
        assert_eq!(store.user_by_email("nobody@example.com").expect("query"), None);
    }
}
