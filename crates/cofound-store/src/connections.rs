//! Connection request handling between users.
//!
//! Links are directed rows in `user_links`; a request creates the
//! `pending`/`received` pair, acceptance swaps that pair for mutual
//! `connection` and `following` edges inside one transaction.

use chrono::Utc;
use rusqlite::params;

use cofound_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Record a connection request: `pending` on the sender, `received` on
    /// the target. Repeating an already-sent request is a no-op.
    pub fn send_connection_request(&self, from: &UserId, to: &UserId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO user_links (user_id, kind, peer_id, added_at)
             VALUES (?1, 'pending', ?2, ?3)",
            params![from.to_string(), to.to_string(), now],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO user_links (user_id, kind, peer_id, added_at)
             VALUES (?1, 'received', ?2, ?3)",
            params![to.to_string(), from.to_string(), now],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Accept a received request: the request pair disappears and both users
    /// gain each other under `connection` and `following`.
    pub fn accept_connection_request(&self, user: &UserId, requester: &UserId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "DELETE FROM user_links
             WHERE user_id = ?1 AND kind = 'received' AND peer_id = ?2",
            params![user.to_string(), requester.to_string()],
        )?;
        tx.execute(
            "DELETE FROM user_links
             WHERE user_id = ?1 AND kind = 'pending' AND peer_id = ?2",
            params![requester.to_string(), user.to_string()],
        )?;

        for kind in ["connection", "following"] {
            tx.execute(
                "INSERT OR IGNORE INTO user_links (user_id, kind, peer_id, added_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user.to_string(), kind, requester.to_string(), now],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO user_links (user_id, kind, peer_id, added_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![requester.to_string(), kind, user.to_string(), now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cofound_shared::types::Role;

    fn open_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn seed_user(db: &Database, email: &str) -> UserId {
        let id = UserId::new();
        db.upsert_user_profile(&id, email, None, Role::Joiner)
            .unwrap();
        id
    }

    #[test]
    fn request_then_accept_is_symmetric() {
        let (_dir, db) = open_test_db();
        let alice = seed_user(&db, "alice@example.com");
        let bob = seed_user(&db, "bob@example.com");

        db.send_connection_request(&alice, &bob).unwrap();

        let a = db.get_user(&alice).unwrap();
        let b = db.get_user(&bob).unwrap();
        assert_eq!(a.pending_connections, vec![bob.clone()]);
        assert_eq!(b.received_requests, vec![alice.clone()]);

        db.accept_connection_request(&bob, &alice).unwrap();

        let a = db.get_user(&alice).unwrap();
        let b = db.get_user(&bob).unwrap();
        assert!(a.pending_connections.is_empty());
        assert!(b.received_requests.is_empty());
        assert_eq!(a.connections, vec![bob.clone()]);
        assert_eq!(b.connections, vec![alice.clone()]);
        assert_eq!(a.following, vec![bob]);
        assert_eq!(b.following, vec![alice]);
    }

    #[test]
    fn duplicate_request_is_idempotent() {
        let (_dir, db) = open_test_db();
        let alice = seed_user(&db, "alice@example.com");
        let bob = seed_user(&db, "bob@example.com");

        db.send_connection_request(&alice, &bob).unwrap();
        db.send_connection_request(&alice, &bob).unwrap();

        let b = db.get_user(&bob).unwrap();
        assert_eq!(b.received_requests.len(), 1);
    }
}
