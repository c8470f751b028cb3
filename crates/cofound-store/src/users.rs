//! User profile CRUD.
//!
//! Profile writes are merge-style: creating an existing profile updates the
//! identity fields and leaves everything else in place, mirroring how the
//! hosted document backend treats `set(..., merge)`.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use cofound_shared::types::{Role, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{EducationEntry, ExperienceEntry, ProfileUpdate, User};

impl Database {
    /// Create a profile document, or merge the identity fields into an
    /// existing one. Plan state, profile sections and links are untouched
    /// on merge.
    pub fn upsert_user_profile(
        &self,
        id: &UserId,
        email: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> Result<User> {
        let now = Utc::now().to_rfc3339();

        self.conn().execute(
            "INSERT INTO users (id, email, display_name, role, created_at, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 email        = excluded.email,
                 display_name = COALESCE(excluded.display_name, users.display_name),
                 role         = excluded.role,
                 last_updated = excluded.last_updated",
            params![id.to_string(), email, display_name, role.as_str(), now],
        )?;

        self.get_user(id)
    }

    pub fn get_user(&self, id: &UserId) -> Result<User> {
        let mut user = self
            .conn()
            .query_row(
                "SELECT id, email, display_name, role, plan, plan_selected, gender,
                        headline, bio, skills, education, experience, created_at, last_updated
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        self.load_links(&mut user)?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        let id: Option<String> = self
            .conn()
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => self.get_user(&UserId::parse(&id)?),
            None => Err(StoreError::NotFound),
        }
    }

    /// All profile documents, oldest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, email, display_name, role, plan, plan_selected, gender,
                    headline, bio, skills, education, experience, created_at, last_updated
             FROM users
             ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            let mut user = row?;
            self.load_links(&mut user)?;
            users.push(user);
        }
        Ok(users)
    }

    /// Record the selected plan and flip `plan_selected`.
    pub fn set_user_plan(&self, id: &UserId, plan: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET plan = ?2, plan_selected = 1, last_updated = ?3 WHERE id = ?1",
            params![id.to_string(), plan, Utc::now().to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Merge-update the profile fields. `None` fields keep their current
    /// value; section lists are replaced wholesale when present.
    pub fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User> {
        let education_json = match &update.education {
            Some(entries) => Some(serde_json::to_string(entries)?),
            None => None,
        };
        let experience_json = match &update.experience {
            Some(entries) => Some(serde_json::to_string(entries)?),
            None => None,
        };

        let affected = self.conn().execute(
            "UPDATE users SET
                 display_name = COALESCE(?2, display_name),
                 gender       = COALESCE(?3, gender),
                 headline     = COALESCE(?4, headline),
                 bio          = COALESCE(?5, bio),
                 skills       = COALESCE(?6, skills),
                 education    = COALESCE(?7, education),
                 experience   = COALESCE(?8, experience),
                 last_updated = ?9
             WHERE id = ?1",
            params![
                id.to_string(),
                update.display_name,
                update.gender,
                update.headline,
                update.bio,
                update.skills,
                education_json,
                experience_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.get_user(id)
    }

    pub fn delete_user_profile(&self, id: &UserId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Populate the four link lists on a loaded user, in added order.
    fn load_links(&self, user: &mut User) -> Result<()> {
        let mut stmt = self.conn().prepare(
            "SELECT kind, peer_id FROM user_links
             WHERE user_id = ?1
             ORDER BY added_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![user.id.to_string()], |row| {
            let kind: String = row.get(0)?;
            let peer: String = row.get(1)?;
            Ok((kind, peer))
        })?;

        for row in rows {
            let (kind, peer) = row?;
            let peer = UserId::parse(&peer)?;
            match kind.as_str() {
                "connection" => user.connections.push(peer),
                "pending" => user.pending_connections.push(peer),
                "received" => user.received_requests.push(peer),
                "following" => user.following.push(peer),
                other => {
                    tracing::warn!(kind = %other, user = %user.id, "unknown link kind in store");
                }
            }
        }
        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let email: String = row.get(1)?;
    let display_name: Option<String> = row.get(2)?;
    let role_str: String = row.get(3)?;
    let plan: Option<String> = row.get(4)?;
    let plan_selected: bool = row.get(5)?;
    let gender: Option<String> = row.get(6)?;
    let headline: Option<String> = row.get(7)?;
    let bio: Option<String> = row.get(8)?;
    let skills: Option<String> = row.get(9)?;
    let education_json: String = row.get(10)?;
    let experience_json: String = row.get(11)?;
    let created_str: String = row.get(12)?;
    let updated_str: String = row.get(13)?;

    let id = UserId::parse(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let role: Role = role_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let education: Vec<EducationEntry> = serde_json::from_str(&education_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let experience: Vec<ExperienceEntry> = serde_json::from_str(&experience_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = parse_timestamp(12, &created_str)?;
    let last_updated = parse_timestamp(13, &updated_str)?;

    Ok(User {
        id,
        email,
        display_name,
        role,
        plan,
        plan_selected,
        gender,
        headline,
        bio,
        skills,
        education,
        experience,
        connections: Vec::new(),
        pending_connections: Vec::new(),
        received_requests: Vec::new(),
        following: Vec::new(),
        created_at,
        last_updated,
    })
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn upsert_merges_identity_fields() {
        let (_dir, db) = open_test_db();
        let id = UserId::new();

        let created = db
            .upsert_user_profile(&id, "ada@example.com", Some("Ada"), Role::Poster)
            .unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert!(!created.plan_selected);

        db.set_user_plan(&id, "Growth Poster").unwrap();

        // Re-creating must not clear the plan or the display name.
        let merged = db
            .upsert_user_profile(&id, "ada@example.com", None, Role::Poster)
            .unwrap();
        assert_eq!(merged.display_name.as_deref(), Some("Ada"));
        assert_eq!(merged.plan.as_deref(), Some("Growth Poster"));
        assert!(merged.plan_selected);
    }

    #[test]
    fn update_profile_keeps_unset_fields() {
        let (_dir, db) = open_test_db();
        let id = UserId::new();
        db.upsert_user_profile(&id, "ada@example.com", Some("Ada"), Role::Joiner)
            .unwrap();

        db.update_profile(
            &id,
            &ProfileUpdate {
                headline: Some("Systems tinkerer".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let user = db
            .update_profile(
                &id,
                &ProfileUpdate {
                    bio: Some("Building things.".into()),
                    education: Some(vec![EducationEntry {
                        degree: "BSc".into(),
                        school: "Somewhere".into(),
                        duration: "2019-2022".into(),
                        description: String::new(),
                    }]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(user.headline.as_deref(), Some("Systems tinkerer"));
        assert_eq!(user.bio.as_deref(), Some("Building things."));
        assert_eq!(user.education.len(), 1);
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn get_user_missing_is_not_found() {
        let (_dir, db) = open_test_db();
        assert!(matches!(
            db.get_user(&UserId::new()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_removes_profile() {
        let (_dir, db) = open_test_db();
        let id = UserId::new();
        db.upsert_user_profile(&id, "ada@example.com", None, Role::Joiner)
            .unwrap();

        assert!(db.delete_user_profile(&id).unwrap());
        assert!(!db.delete_user_profile(&id).unwrap());
        assert!(matches!(db.get_user(&id), Err(StoreError::NotFound)));
    }
}
