//! Message CRUD for the per-post conversation threads.
//!
//! `created_at` is assigned here, not by callers, and is clamped so it never
//! decreases within a post. Timestamps are stored at fixed microsecond
//! precision, which makes the TEXT column order identical to chronological
//! order and keeps the ascending thread query deterministic.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension};

use cofound_shared::types::{MessageId, PostId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Message, ReplyPreview};

impl Database {
    /// Append a message to a post's thread with a server-assigned timestamp.
    pub fn append_message(
        &self,
        post_id: &PostId,
        sender_uid: &UserId,
        sender: &str,
        sender_name: &str,
        text: &str,
        reply_to: Option<&ReplyPreview>,
    ) -> Result<Message> {
        let id = MessageId::new();
        let created_at = self.next_message_timestamp(post_id)?;
        let reply_json = match reply_to {
            Some(preview) => Some(serde_json::to_string(preview)?),
            None => None,
        };

        self.conn().execute(
            "INSERT INTO messages (id, post_id, text, sender, sender_uid, sender_name,
                                   created_at, reply_to, edited, reactions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, '[]')",
            params![
                id.to_string(),
                post_id.to_string(),
                text,
                sender,
                sender_uid.to_string(),
                sender_name,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                reply_json,
            ],
        )?;

        Ok(Message {
            id,
            post_id: post_id.clone(),
            text: text.to_string(),
            sender: sender.to_string(),
            sender_uid: sender_uid.clone(),
            sender_name: sender_name.to_string(),
            created_at,
            reply_to: reply_to.cloned(),
            edited: false,
            reactions: Vec::new(),
        })
    }

    /// Replace a message's text and mark it edited. Id, sender and timestamp
    /// are preserved.
    pub fn edit_message_text(
        &self,
        post_id: &PostId,
        id: &MessageId,
        new_text: &str,
    ) -> Result<Message> {
        let affected = self.conn().execute(
            "UPDATE messages SET text = ?3, edited = 1 WHERE id = ?1 AND post_id = ?2",
            params![id.to_string(), post_id.to_string(), new_text],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.get_message(post_id, id)
    }

    pub fn get_message(&self, post_id: &PostId, id: &MessageId) -> Result<Message> {
        self.conn()
            .query_row(
                "SELECT id, post_id, text, sender, sender_uid, sender_name,
                        created_at, reply_to, edited, reactions
                 FROM messages WHERE id = ?1 AND post_id = ?2",
                params![id.to_string(), post_id.to_string()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Full thread for a post, oldest first with insertion-order tiebreak.
    pub fn list_messages(&self, post_id: &PostId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, post_id, text, sender, sender_uid, sender_name,
                    created_at, reply_to, edited, reactions
             FROM messages
             WHERE post_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![post_id.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Next server timestamp for a post: the current time, pushed forward by
    /// one microsecond past the thread's latest message if the clock has not
    /// advanced since. Truncated to the stored precision so a written value
    /// reads back identical.
    fn next_message_timestamp(&self, post_id: &PostId) -> Result<DateTime<Utc>> {
        let now = Utc::now().trunc_subsecs(6);

        let last: Option<String> = self
            .conn()
            .query_row(
                "SELECT created_at FROM messages
                 WHERE post_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                params![post_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(last) = last else {
            return Ok(now);
        };

        let last = DateTime::parse_from_rfc3339(&last)?.with_timezone(&Utc);
        if now > last {
            Ok(now)
        } else {
            Ok(last + Duration::microseconds(1))
        }
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let post_id_str: String = row.get(1)?;
    let sender_uid_str: String = row.get(4)?;
    let ts_str: String = row.get(6)?;
    let reply_json: Option<String> = row.get(7)?;
    let reactions_json: String = row.get(9)?;

    let id = MessageId::parse(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let post_id = PostId::parse(&post_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let sender_uid = UserId::parse(&sender_uid_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let reply_to: Option<ReplyPreview> = match reply_json {
        Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    let reactions: Vec<String> = serde_json::from_str(&reactions_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Message {
        id,
        post_id,
        text: row.get(2)?,
        sender: row.get(3)?,
        sender_uid,
        sender_name: row.get(5)?,
        created_at,
        reply_to,
        edited: row.get(8)?,
        reactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;
    use cofound_shared::types::Role;

    fn open_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn seed_post(db: &Database) -> (UserId, PostId) {
        let uid = UserId::new();
        db.upsert_user_profile(&uid, "owner@example.com", Some("Owner"), Role::Poster)
            .unwrap();
        let post = db
            .insert_post(&NewPost {
                uid: uid.clone(),
                email: "owner@example.com".into(),
                name: "Solar kiosks".into(),
                description: "A business idea.".into(),
                ..Default::default()
            })
            .unwrap();
        (uid, post.id)
    }

    #[test]
    fn append_and_list_in_send_order() {
        let (_dir, db) = open_test_db();
        let (uid, post_id) = seed_post(&db);

        for text in ["one", "two", "three"] {
            db.append_message(&post_id, &uid, "owner@example.com", "Owner", text, None)
                .unwrap();
        }

        let thread = db.list_messages(&post_id).unwrap();
        let texts: Vec<_> = thread.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);

        // Server-assigned timestamps strictly increase within a post.
        for pair in thread.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
    }

    #[test]
    fn reply_preview_round_trips() {
        let (_dir, db) = open_test_db();
        let (uid, post_id) = seed_post(&db);

        let preview = ReplyPreview {
            sender: "joiner@example.com".into(),
            text: "Interested in the ops side.".into(),
        };
        db.append_message(
            &post_id,
            &uid,
            "owner@example.com",
            "Owner",
            "Let's talk",
            Some(&preview),
        )
        .unwrap();

        let thread = db.list_messages(&post_id).unwrap();
        assert_eq!(thread[0].reply_to.as_ref(), Some(&preview));
    }

    #[test]
    fn edit_preserves_identity_and_sets_flag() {
        let (_dir, db) = open_test_db();
        let (uid, post_id) = seed_post(&db);

        let sent = db
            .append_message(&post_id, &uid, "owner@example.com", "Owner", "typo", None)
            .unwrap();
        let edited = db
            .edit_message_text(&post_id, &sent.id, "fixed")
            .unwrap();

        assert_eq!(edited.id, sent.id);
        assert_eq!(edited.text, "fixed");
        assert!(edited.edited);
        assert_eq!(edited.created_at, sent.created_at);
        assert_eq!(edited.sender, sent.sender);
    }

    #[test]
    fn edit_unknown_message_is_not_found() {
        let (_dir, db) = open_test_db();
        let (_uid, post_id) = seed_post(&db);

        assert!(matches!(
            db.edit_message_text(&post_id, &MessageId::new(), "x"),
            Err(StoreError::NotFound)
        ));
    }
}
