//! Shared store handle with a change feed and live query subscriptions.
//!
//! [`Store`] wraps the SQLite [`Database`] behind a mutex so one handle can
//! be cloned into every view. Every write publishes a [`Change`] on a
//! broadcast channel, and [`Store::subscribe_messages`] /
//! [`Store::subscribe_owned_posts`] turn that into live feeds: each delivery
//! is the complete current result of the query, never a diff, so applying
//! the latest snapshot is always enough to catch up.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use cofound_shared::types::{MessageId, PostId, Role, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Message, NewPost, Post, ProfileUpdate, ReplyPreview, User};

/// Capacity of the broadcast change channel. A feed that falls this far
/// behind resynchronizes with a fresh snapshot, so lag is not fatal.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Write category published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A profile document or connection edge changed.
    Users,
    /// A post was created or updated.
    Posts,
    /// The message thread of the given post changed.
    Messages(PostId),
}

struct StoreInner {
    db: Mutex<Database>,
    changes: broadcast::Sender<Change>,
}

/// Cloneable handle to the application store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Open the default on-disk database.
    pub fn open() -> Result<Self> {
        Ok(Self::from_database(Database::new()?))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::from_database(Database::open_at(path)?))
    }

    /// Open a private in-memory store for tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    fn from_database(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                db: Mutex::new(db),
                changes,
            }),
        }
    }

    /// Number of live feeds currently attached, for diagnostics.
    pub fn subscription_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    pub(crate) fn with_db<T, E>(&self, f: impl FnOnce(&Database) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let db = self
            .inner
            .db
            .lock()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;
        f(&db)
    }

    fn publish(&self, change: Change) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.inner.changes.send(change);
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Create a profile document, or merge the identity fields into an
    /// existing one.
    pub async fn create_user_profile(
        &self,
        id: &UserId,
        email: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> Result<User> {
        let user = self.with_db(|db| db.upsert_user_profile(id, email, display_name, role))?;
        self.publish(Change::Users);
        Ok(user)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User> {
        self.with_db(|db| db.get_user(id))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.with_db(|db| db.get_user_by_email(email))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.with_db(|db| db.list_users())
    }

    /// Record the selected plan and flip the plan-selected flag.
    pub async fn set_user_plan(&self, id: &UserId, plan: &str) -> Result<()> {
        self.with_db(|db| db.set_user_plan(id, plan))?;
        self.publish(Change::Users);
        Ok(())
    }

    /// Merge-update profile fields; `None` fields keep their current value.
    pub async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User> {
        let user = self.with_db(|db| db.update_profile(id, update))?;
        self.publish(Change::Users);
        Ok(user)
    }

    pub async fn set_display_name(&self, id: &UserId, display_name: &str) -> Result<User> {
        let update = ProfileUpdate {
            display_name: Some(display_name.to_string()),
            ..ProfileUpdate::default()
        };
        self.update_profile(id, &update).await
    }

    /// Remove a profile document. Returns whether a document existed.
    pub async fn delete_user_profile(&self, id: &UserId) -> Result<bool> {
        let deleted = self.with_db(|db| db.delete_user_profile(id))?;
        if deleted {
            self.publish(Change::Users);
        }
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Record an outgoing request on `from` and an incoming one on `to`.
    pub async fn send_connection_request(&self, from: &UserId, to: &UserId) -> Result<()> {
        self.with_db(|db| db.send_connection_request(from, to))?;
        self.publish(Change::Users);
        Ok(())
    }

    /// Accept `requester`'s pending request: both sides become connections
    /// and follow each other.
    pub async fn accept_connection_request(&self, user: &UserId, requester: &UserId) -> Result<()> {
        self.with_db(|db| db.accept_connection_request(user, requester))?;
        self.publish(Change::Users);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn create_post(&self, new: &NewPost) -> Result<Post> {
        let post = self.with_db(|db| db.insert_post(new))?;
        self.publish(Change::Posts);
        Ok(post)
    }

    pub async fn get_post(&self, id: &PostId) -> Result<Post> {
        self.with_db(|db| db.get_post(id))
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        self.with_db(|db| db.list_posts())
    }

    /// One owner's posts, newest first.
    pub async fn list_posts_by_owner(&self, uid: &UserId) -> Result<Vec<Post>> {
        self.with_db(|db| db.list_posts_by_owner(uid))
    }

    pub async fn count_posts_by_owner(&self, uid: &UserId) -> Result<u32> {
        self.with_db(|db| db.count_posts_by_owner(uid))
    }

    pub async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>> {
        self.with_db(|db| db.recent_posts(limit))
    }

    /// Add or remove `user_id` from a post's likers and recount.
    pub async fn toggle_like(&self, post_id: &PostId, user_id: &UserId) -> Result<Post> {
        let post = self.with_db(|db| db.toggle_like(post_id, user_id))?;
        self.publish(Change::Posts);
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Append a message to a post's thread. The timestamp is assigned here,
    /// not by the caller.
    pub async fn add_message(
        &self,
        post_id: &PostId,
        sender_uid: &UserId,
        sender: &str,
        sender_name: &str,
        text: &str,
        reply_to: Option<&ReplyPreview>,
    ) -> Result<Message> {
        let message = self.with_db(|db| {
            db.append_message(post_id, sender_uid, sender, sender_name, text, reply_to)
        })?;
        tracing::debug!(post = %post_id, msg = %message.id, "message appended");
        self.publish(Change::Messages(post_id.clone()));
        Ok(message)
    }

    /// Replace a message's text in place and mark it edited.
    pub async fn edit_message(
        &self,
        post_id: &PostId,
        id: &MessageId,
        new_text: &str,
    ) -> Result<Message> {
        let message = self.with_db(|db| db.edit_message_text(post_id, id, new_text))?;
        tracing::debug!(post = %post_id, msg = %id, "message edited");
        self.publish(Change::Messages(post_id.clone()));
        Ok(message)
    }

    /// Full thread for a post, oldest first.
    pub async fn list_messages(&self, post_id: &PostId) -> Result<Vec<Message>> {
        self.with_db(|db| db.list_messages(post_id))
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    pub async fn set_preference(
        &self,
        user_id: &UserId,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        self.with_db(|db| db.set_preference(user_id, key, value))
    }

    pub async fn get_preference(
        &self,
        user_id: &UserId,
        key: &str,
    ) -> Result<Option<serde_json::Value>> {
        self.with_db(|db| db.get_preference(user_id, key))
    }

    pub async fn delete_preference(&self, user_id: &UserId, key: &str) -> Result<bool> {
        self.with_db(|db| db.delete_preference(user_id, key))
    }

    // ------------------------------------------------------------------
    // Live feeds
    // ------------------------------------------------------------------

    /// Subscribe to a post's message thread. The feed delivers the current
    /// thread right away, then the full thread again after every write to it.
    pub fn subscribe_messages(&self, post_id: &PostId) -> MessageFeed {
        let wanted = post_id.clone();
        let queried = post_id.clone();
        self.spawn_feed(
            move |change| matches!(change, Change::Messages(id) if *id == wanted),
            move |db| db.list_messages(&queried),
        )
    }

    /// Subscribe to one owner's posts, newest first. Redelivered whenever
    /// any post changes; the snapshot is filtered to the owner either way.
    pub fn subscribe_owned_posts(&self, owner: &UserId) -> PostFeed {
        let owner = owner.clone();
        self.spawn_feed(
            |change| matches!(change, Change::Posts),
            move |db| db.list_posts_by_owner(&owner),
        )
    }

    /// Spawn a feed task: deliver one snapshot immediately, then re-run the
    /// query after every relevant change. The broadcast receiver is taken
    /// before the initial query so no write can fall in between.
    fn spawn_feed<T, F, Q>(&self, relevant: F, query: Q) -> Feed<T>
    where
        T: Send + 'static,
        F: Fn(&Change) -> bool + Send + 'static,
        Q: Fn(&Database) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let mut changes = self.inner.changes.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            if deliver(&inner, &query, &tx).is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(change) if relevant(&change) => {
                        if deliver(&inner, &query, &tx).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    // Missed changes; resynchronize with a fresh snapshot.
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if deliver(&inner, &query, &tx).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Feed { rx, task }
    }
}

/// Run a feed's query and push the snapshot. `Err` means the receiving side
/// is gone and the feed task should stop; a failed query keeps the feed
/// alive so the next change can retry.
fn deliver<T>(
    inner: &StoreInner,
    query: &impl Fn(&Database) -> Result<T>,
    tx: &mpsc::UnboundedSender<T>,
) -> Result<(), ()> {
    let snapshot = {
        let db = match inner.db.lock() {
            Ok(db) => db,
            Err(_) => {
                tracing::error!("store mutex poisoned; live feed stopping");
                return Err(());
            }
        };
        query(&db)
    };

    match snapshot {
        Ok(snapshot) => tx.send(snapshot).map_err(|_| ()),
        Err(e) => {
            tracing::error!(error = %e, "live feed query failed");
            Ok(())
        }
    }
}

/// A live query feed backed by a store task. Dropping the feed cancels the
/// task, so no delivery can arrive after the handle is gone.
pub struct Feed<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: JoinHandle<()>,
}

/// Live feed of one post's full message thread.
pub type MessageFeed = Feed<Vec<Message>>;

/// Live feed of one owner's posts.
pub type PostFeed = Feed<Vec<Post>>;

impl<T> Feed<T> {
    /// Wait for the next snapshot. `None` once the feed has shut down.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Drop for Feed<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn seeded_store() -> (Store, UserId, PostId) {
        let store = Store::open_in_memory().expect("open store");
        let owner = UserId::new();
        store
            .create_user_profile(&owner, "owner@example.com", Some("Owner"), Role::Poster)
            .await
            .expect("create profile");
        let post = store
            .create_post(&NewPost {
                uid: owner.clone(),
                email: "owner@example.com".into(),
                name: "Chai Carts".into(),
                description: "Solar-powered chai carts for tech parks".into(),
                ..NewPost::default()
            })
            .await
            .expect("create post");
        (store, owner, post.id)
    }

    #[tokio::test]
    async fn message_feed_delivers_initial_then_full_snapshots() {
        let (store, owner, post_id) = seeded_store().await;

        let mut feed = store.subscribe_messages(&post_id);
        let initial = feed.recv().await.expect("initial snapshot");
        assert!(initial.is_empty());

        store
            .add_message(&post_id, &owner, "owner@example.com", "Owner", "hello", None)
            .await
            .unwrap();
        let first = feed.recv().await.expect("snapshot after first write");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].text, "hello");

        store
            .add_message(&post_id, &owner, "owner@example.com", "Owner", "again", None)
            .await
            .unwrap();
        let second = feed.recv().await.expect("snapshot after second write");
        assert_eq!(second.len(), 2, "deliveries are whole threads, not diffs");
        assert_eq!(second[1].text, "again");
    }

    #[tokio::test]
    async fn message_feed_skips_other_threads() {
        let (store, owner, post_a) = seeded_store().await;
        let post_b = store
            .create_post(&NewPost {
                uid: owner.clone(),
                email: "owner@example.com".into(),
                name: "Second idea".into(),
                description: "A completely different venture".into(),
                ..NewPost::default()
            })
            .await
            .unwrap()
            .id;

        let mut feed = store.subscribe_messages(&post_a);
        assert!(feed.recv().await.expect("initial").is_empty());

        store
            .add_message(&post_b, &owner, "owner@example.com", "Owner", "elsewhere", None)
            .await
            .unwrap();
        store
            .add_message(&post_a, &owner, "owner@example.com", "Owner", "here", None)
            .await
            .unwrap();

        // The next delivery corresponds to post A's write; post B's write
        // produced none.
        let snapshot = feed.recv().await.expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text, "here");
    }

    #[tokio::test]
    async fn dropped_feed_cancels_its_subscription() {
        let (store, _owner, post_id) = seeded_store().await;
        assert_eq!(store.subscription_count(), 0);

        let mut feed = store.subscribe_messages(&post_id);
        assert!(feed.recv().await.is_some());
        assert_eq!(store.subscription_count(), 1);

        drop(feed);
        for _ in 0..200 {
            if store.subscription_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(store.subscription_count(), 0);
    }

    #[tokio::test]
    async fn owned_posts_feed_tracks_only_the_owner() {
        let (store, owner, _post) = seeded_store().await;
        let other = UserId::new();
        store
            .create_user_profile(&other, "other@example.com", None, Role::Poster)
            .await
            .unwrap();

        let mut feed = store.subscribe_owned_posts(&owner);
        let initial = feed.recv().await.expect("initial snapshot");
        assert_eq!(initial.len(), 1);

        store
            .create_post(&NewPost {
                uid: other.clone(),
                email: "other@example.com".into(),
                name: "Not ours".into(),
                description: "Someone else's startup idea".into(),
                ..NewPost::default()
            })
            .await
            .unwrap();
        let redelivered = feed.recv().await.expect("redelivery");
        assert_eq!(redelivered.len(), 1, "other owners' posts stay out");

        store
            .create_post(&NewPost {
                uid: owner.clone(),
                email: "owner@example.com".into(),
                name: "Second of ours".into(),
                description: "Another venture from the same owner".into(),
                ..NewPost::default()
            })
            .await
            .unwrap();
        let grown = feed.recv().await.expect("snapshot with new post");
        assert_eq!(grown.len(), 2);
        assert_eq!(grown[0].name, "Second of ours", "newest first");
    }
}
