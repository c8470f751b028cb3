//! Client-local preferences (saved searches, app settings).
//!
//! A plain per-user key/value table holding JSON. Not part of the document
//! contract shared with other clients.

use rusqlite::{params, OptionalExtension};

use cofound_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;

impl Database {
    pub fn set_preference(
        &self,
        user_id: &UserId,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO preferences (user_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value",
            params![user_id.to_string(), key, serde_json::to_string(value)?],
        )?;
        Ok(())
    }

    pub fn get_preference(&self, user_id: &UserId, key: &str) -> Result<Option<serde_json::Value>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM preferences WHERE user_id = ?1 AND key = ?2",
                params![user_id.to_string(), key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn delete_preference(&self, user_id: &UserId, key: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM preferences WHERE user_id = ?1 AND key = ?2",
            params![user_id.to_string(), key],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let user = UserId::new();

        assert!(db.get_preference(&user, "savedSearch").unwrap().is_none());

        db.set_preference(&user, "savedSearch", &serde_json::json!({"term": "solar"}))
            .unwrap();
        db.set_preference(&user, "savedSearch", &serde_json::json!({"term": "wind"}))
            .unwrap();

        let value = db.get_preference(&user, "savedSearch").unwrap().unwrap();
        assert_eq!(value["term"], "wind");

        assert!(db.delete_preference(&user, "savedSearch").unwrap());
        assert!(db.get_preference(&user, "savedSearch").unwrap().is_none());
    }
}
