//! The owner's conversation sidebar: one entry per (owned post, counterpart)
//! pair, aggregated from the post threads.
//!
//! The post list is live; each delivery re-reads the per-post threads once.
//! New counterparts therefore appear when the post set changes or on an
//! explicit [`ConversationList::refresh`], not on every message.

use cofound_shared::types::PostId;
use cofound_store::{AuthUser, Message, Post, PostFeed, Store};

use crate::error::Result;

/// Distinct sender emails in first-seen order, excluding the post owner's
/// email and messages with no sender recorded.
pub fn distinct_counterparts(messages: &[Message], owner_email: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for message in messages {
        let sender = message.sender.as_str();
        if sender.is_empty() || sender == owner_email {
            continue;
        }
        if !seen.iter().any(|s| s == sender) {
            seen.push(sender.to_string());
        }
    }
    seen
}

/// One selectable conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub post_id: PostId,
    pub post_title: String,
    pub counterpart: String,
}

/// Live list of an owner's conversations.
pub struct ConversationList {
    store: Store,
    owner: AuthUser,
    feed: PostFeed,
    entries: Vec<ConversationEntry>,
    selected: Option<(PostId, String)>,
}

impl ConversationList {
    /// Open the list and wait for the first snapshot.
    pub async fn open(store: Store, owner: AuthUser) -> Self {
        let mut list = Self {
            feed: store.subscribe_owned_posts(&owner.uid),
            store,
            owner,
            entries: Vec::new(),
            selected: None,
        };
        list.next_delivery().await;
        list
    }

    /// Pump one post-list delivery and rebuild the entries. Returns `false`
    /// when the feed has ended.
    pub async fn next_delivery(&mut self) -> bool {
        let Some(posts) = self.feed.recv().await else {
            return false;
        };
        self.rebuild(posts).await;
        true
    }

    /// Re-aggregate from the current post set without waiting for a change.
    pub async fn refresh(&mut self) -> Result<()> {
        let posts = self.store.list_posts_by_owner(&self.owner.uid).await?;
        self.rebuild(posts).await;
        Ok(())
    }

    /// Posts arrive newest first; counterparts keep first-message order
    /// within each post. A post whose thread cannot be read is skipped.
    async fn rebuild(&mut self, posts: Vec<Post>) {
        let mut entries = Vec::new();
        for post in &posts {
            let messages = match self.store.list_messages(&post.id).await {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::error!(post = %post.id, error = %e, "thread fetch failed");
                    continue;
                }
            };

            let title = if post.name.is_empty() {
                "Untitled"
            } else {
                post.name.as_str()
            };
            for counterpart in distinct_counterparts(&messages, &post.email) {
                entries.push(ConversationEntry {
                    post_id: post.id.clone(),
                    post_title: title.to_string(),
                    counterpart,
                });
            }
        }
        self.entries = entries;

        // Keep the selection while its entry exists; otherwise fall back to
        // the first entry, which also covers the initial auto-select.
        let still_present = self.selected.as_ref().is_some_and(|(post_id, counterpart)| {
            self.entries
                .iter()
                .any(|e| &e.post_id == post_id && &e.counterpart == counterpart)
        });
        if !still_present {
            self.selected = self
                .entries
                .first()
                .map(|e| (e.post_id.clone(), e.counterpart.clone()));
        }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Select an entry. Returns whether it exists.
    pub fn select(&mut self, post_id: &PostId, counterpart: &str) -> bool {
        let exists = self
            .entries
            .iter()
            .any(|e| &e.post_id == post_id && e.counterpart == counterpart);
        if exists {
            self.selected = Some((post_id.clone(), counterpart.to_string()));
        }
        exists
    }

    pub fn selected(&self) -> Option<&ConversationEntry> {
        let (post_id, counterpart) = self.selected.as_ref()?;
        self.entries
            .iter()
            .find(|e| &e.post_id == post_id && &e.counterpart == counterpart)
    }
}

/// One owned post with the counterparts who have written in its thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyPostEntry {
    pub post: Post,
    pub counterparts: Vec<String>,
}

/// One-shot list of every post owned by `owner`, newest first, each with
/// its current counterparts. Silent posts are included; each opens as a
/// full-thread conversation.
pub async fn my_posts(store: &Store, owner: &AuthUser) -> Result<Vec<MyPostEntry>> {
    let posts = store.list_posts_by_owner(&owner.uid).await?;
    let mut entries = Vec::with_capacity(posts.len());
    for post in posts {
        let messages = store.list_messages(&post.id).await?;
        let counterparts = distinct_counterparts(&messages, &post.email);
        entries.push(MyPostEntry { post, counterparts });
    }
    Ok(entries)
}
