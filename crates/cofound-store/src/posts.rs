//! Post (startup idea) CRUD.

use chrono::{DateTime, Utc};
use rusqlite::params;

use cofound_shared::types::{PostId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewPost, Post};

const POST_COLUMNS: &str = "id, uid, email, posted_by, name, tagline, description, industry, \
     stage, skills_needed, location, budget, timeline, team_size, is_remote, experience, \
     equity, plan_used, status, views, likes, liked_by, created_at, updated_at";

impl Database {
    /// Insert a new post. The store assigns the id, both timestamps, the
    /// `active` status and zeroed counters.
    pub fn insert_post(&self, new: &NewPost) -> Result<Post> {
        let id = PostId::new();
        let now = Utc::now();

        self.conn().execute(
            "INSERT INTO posts (id, uid, email, posted_by, name, tagline, description,
                                industry, stage, skills_needed, location, budget, timeline,
                                team_size, is_remote, experience, equity, plan_used,
                                status, views, likes, liked_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, 'active', 0, 0, '[]', ?19, ?19)",
            params![
                id.to_string(),
                new.uid.to_string(),
                new.email,
                new.posted_by,
                new.name,
                new.tagline,
                new.description,
                new.industry,
                new.stage,
                new.skills_needed,
                new.location,
                new.budget,
                new.timeline,
                new.team_size,
                new.is_remote,
                new.experience,
                new.equity,
                new.plan_used,
                now.to_rfc3339(),
            ],
        )?;

        self.get_post(&id)
    }

    pub fn get_post(&self, id: &PostId) -> Result<Post> {
        self.conn()
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id.to_string()],
                row_to_post,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map([], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// Posts owned by `uid`, newest first.
    pub fn list_posts_by_owner(&self, uid: &UserId) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE uid = ?1 ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![uid.to_string()], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    pub fn count_posts_by_owner(&self, uid: &UserId) -> Result<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM posts WHERE uid = ?1",
            params![uid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// The `limit` most recent posts.
    pub fn recent_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// Add or remove `user_id` from the post's like list. The counter is
    /// recomputed from the list so the two can never drift apart.
    pub fn toggle_like(&self, post_id: &PostId, user_id: &UserId) -> Result<Post> {
        let tx = self.conn().unchecked_transaction()?;

        let liked_by_json: String = tx
            .query_row(
                "SELECT liked_by FROM posts WHERE id = ?1",
                params![post_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        let mut liked_by: Vec<UserId> = serde_json::from_str(&liked_by_json)?;
        match liked_by.iter().position(|u| u == user_id) {
            Some(idx) => {
                liked_by.remove(idx);
            }
            None => liked_by.push(user_id.clone()),
        }

        tx.execute(
            "UPDATE posts SET likes = ?2, liked_by = ?3 WHERE id = ?1",
            params![
                post_id.to_string(),
                liked_by.len() as i64,
                serde_json::to_string(&liked_by)?,
            ],
        )?;

        tx.commit()?;
        self.get_post(post_id)
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let id_str: String = row.get(0)?;
    let uid_str: String = row.get(1)?;
    let liked_by_json: String = row.get(21)?;
    let created_str: String = row.get(22)?;
    let updated_str: String = row.get(23)?;

    let id = PostId::parse(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let uid = UserId::parse(&uid_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let liked_by: Vec<UserId> = serde_json::from_str(&liked_by_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(21, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = parse_timestamp(22, &created_str)?;
    let updated_at = parse_timestamp(23, &updated_str)?;

    Ok(Post {
        id,
        uid,
        email: row.get(2)?,
        posted_by: row.get(3)?,
        name: row.get(4)?,
        tagline: row.get(5)?,
        description: row.get(6)?,
        industry: row.get(7)?,
        stage: row.get(8)?,
        skills_needed: row.get(9)?,
        location: row.get(10)?,
        budget: row.get(11)?,
        timeline: row.get(12)?,
        team_size: row.get(13)?,
        is_remote: row.get(14)?,
        experience: row.get(15)?,
        equity: row.get(16)?,
        plan_used: row.get(17)?,
        status: row.get(18)?,
        views: row.get(19)?,
        likes: row.get(20)?,
        liked_by,
        created_at,
        updated_at,
    })
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
