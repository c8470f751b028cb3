//! The live conversation view: one post's message thread, filtered for the
//! viewer, with reply/edit arming, an in-flight send lock and viewport
//! bookkeeping.
//!
//! The view owns a [`MessageFeed`] and applies whole-thread snapshots, so
//! its message list is always exactly one delivery, never an accumulation.
//! Each feed is tagged with an epoch; [`ConversationView::retarget`] bumps
//! it, which makes any delivery still in flight for the old thread inert.

use std::time::Instant;

use cofound_shared::constants::{JUMP_TO_LATEST_THRESHOLD_PX, TYPING_INDICATOR_TTL};
use cofound_shared::types::{MessageId, PostId};
use cofound_store::{AuthUser, Message, MessageFeed, Post, ReplyPreview, Store, StoreError};

use crate::error::{ClientError, Result};
use crate::notices::NoticeSink;

/// Lifecycle of the view, derived from what has resolved so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No signed-in user; the thread renders but input is disabled.
    Unauthenticated,
    /// Signed in, post metadata not yet fetched; header shows a placeholder.
    Loading,
    /// Post metadata present.
    Ready,
}

/// The owner-side filter for a two-party dialog: when the viewer owns the
/// post (by email) and a counterpart is chosen, keep only the owner's own
/// messages (email *and* sender id must both match) plus the counterpart's.
/// Any other viewer, or a missing counterpart or post, sees the whole
/// thread. Order is preserved.
pub fn visible_messages<'a>(
    messages: &'a [Message],
    user: Option<&AuthUser>,
    post: Option<&Post>,
    counterpart: Option<&str>,
) -> Vec<&'a Message> {
    let (Some(user), Some(post), Some(counterpart)) = (user, post, counterpart) else {
        return messages.iter().collect();
    };
    if user.email != post.email {
        return messages.iter().collect();
    }

    messages
        .iter()
        .filter(|m| (m.sender == user.email && m.sender_uid == user.uid) || m.sender == counterpart)
        .collect()
}

/// Composition captured at the moment a send is accepted.
#[derive(Debug)]
struct PendingSend {
    user: AuthUser,
    text: String,
    reply: Option<ReplyPreview>,
    edit: Option<MessageId>,
}

/// Live view of one post's conversation.
pub struct ConversationView {
    store: Store,
    notices: NoticeSink,

    post_id: PostId,
    /// Counterpart email selecting the two-party dialog, owner side only.
    counterpart: Option<String>,

    user: Option<AuthUser>,
    post: Option<Post>,
    messages: Vec<Message>,
    feed: Option<MessageFeed>,
    /// Bumped on every retarget; deliveries are tagged with the epoch they
    /// were subscribed under and stale ones are dropped.
    epoch: u64,

    input: String,
    reply_target: Option<ReplyPreview>,
    edit_target: Option<MessageId>,
    sending: bool,
    typing_until: Option<Instant>,
    /// Distance in pixels between the viewport and the latest message.
    scroll_offset_px: u32,
}

impl ConversationView {
    /// Create a view of one post's thread. `counterpart` selects the
    /// owner-side two-party dialog; `None` shows the whole thread.
    pub fn new(
        store: Store,
        notices: NoticeSink,
        post_id: PostId,
        counterpart: Option<String>,
    ) -> Self {
        Self {
            store,
            notices,
            post_id,
            counterpart,
            user: None,
            post: None,
            messages: Vec::new(),
            feed: None,
            epoch: 0,
            input: String::new(),
            reply_target: None,
            edit_target: None,
            sending: false,
            typing_until: None,
            scroll_offset_px: 0,
        }
    }

    /// Feed the session's auth state into the view. `None` disables input
    /// but keeps the thread readable.
    pub fn set_user(&mut self, user: Option<AuthUser>) {
        self.user = user;
    }

    /// Fetch post metadata and (re)open the live feed. A missing post is
    /// not an error: the view stays in [`Phase::Loading`] and shows the
    /// thread unfiltered.
    pub async fn activate(&mut self) {
        self.post = match self.store.get_post(&self.post_id).await {
            Ok(post) => Some(post),
            Err(StoreError::NotFound) => {
                tracing::warn!(post = %self.post_id, "post does not exist");
                None
            }
            Err(e) => {
                tracing::error!(post = %self.post_id, error = %e, "post metadata fetch failed");
                self.notices.error("Could not load the conversation.");
                None
            }
        };
        self.feed = Some(self.store.subscribe_messages(&self.post_id));
    }

    /// Point the view at a different post/counterpart pair. The previous
    /// feed is dropped, deliveries still in flight for it become inert, and
    /// thread-specific composition state (reply/edit) is cleared. The input
    /// draft survives.
    pub async fn retarget(&mut self, post_id: PostId, counterpart: Option<String>) {
        self.epoch += 1;
        self.feed = None;
        self.post = None;
        self.messages.clear();
        self.post_id = post_id;
        self.counterpart = counterpart;
        self.reply_target = None;
        self.edit_target = None;
        self.activate().await;
    }

    /// Pump one feed delivery into the view. Returns `false` when no feed
    /// is open or the feed has ended.
    pub async fn next_delivery(&mut self) -> bool {
        let epoch = self.epoch;
        let Some(feed) = self.feed.as_mut() else {
            return false;
        };
        match feed.recv().await {
            Some(snapshot) => self.apply_snapshot(epoch, snapshot),
            None => false,
        }
    }

    /// Apply a feed delivery tagged with the epoch it was subscribed under.
    /// Stale deliveries are ignored. Returns whether the snapshot landed.
    pub fn apply_snapshot(&mut self, epoch: u64, snapshot: Vec<Message>) -> bool {
        if epoch != self.epoch {
            tracing::debug!(post = %self.post_id, "stale snapshot ignored");
            return false;
        }
        self.messages = snapshot;
        // The viewport snaps to the latest message on every thread change.
        self.scroll_offset_px = 0;
        true
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        if self.user.is_none() {
            Phase::Unauthenticated
        } else if self.post.is_none() {
            Phase::Loading
        } else {
            Phase::Ready
        }
    }

    /// Messages this viewer should see, in thread order.
    pub fn visible(&self) -> Vec<&Message> {
        visible_messages(
            &self.messages,
            self.user.as_ref(),
            self.post.as_ref(),
            self.counterpart.as_deref(),
        )
    }

    /// Header title: the post name once metadata has loaded.
    pub fn title(&self) -> &str {
        self.post.as_ref().map_or("Chat", |p| p.name.as_str())
    }

    /// Who the viewer is talking to, for the header line.
    pub fn counterpart_label(&self) -> &str {
        if let Some(counterpart) = self.counterpart.as_deref() {
            return counterpart;
        }
        self.post
            .as_ref()
            .and_then(|p| p.posted_by.as_deref())
            .unwrap_or("Poster")
    }

    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    pub fn counterpart(&self) -> Option<&str> {
        self.counterpart.as_deref()
    }

    /// The epoch current deliveries must carry to be applied.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // ------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------

    /// Replace the input draft and refresh the typing indicator.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.typing_until = Some(Instant::now() + TYPING_INDICATOR_TTL);
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Input is enabled only for signed-in viewers.
    pub fn input_enabled(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Local-only typing indicator; true within the TTL of the last edit.
    pub fn is_typing(&self) -> bool {
        self.typing_at(Instant::now())
    }

    fn typing_at(&self, now: Instant) -> bool {
        self.typing_until.is_some_and(|until| now < until)
    }

    /// Quote `target` in the next send. Replaces any armed edit.
    pub fn arm_reply(&mut self, target: &Message) {
        self.reply_target = Some(ReplyPreview {
            sender: target.sender.clone(),
            text: target.text.clone(),
        });
        self.edit_target = None;
    }

    pub fn cancel_reply(&mut self) {
        self.reply_target = None;
    }

    pub fn reply_target(&self) -> Option<&ReplyPreview> {
        self.reply_target.as_ref()
    }

    /// Load `target` into the input for an in-place edit. Only the
    /// viewer's own messages qualify. Replaces any armed reply.
    pub fn arm_edit(&mut self, target: &Message) -> Result<()> {
        let user = self.user.as_ref().ok_or(ClientError::NotSignedIn)?;
        if target.sender_uid != user.uid {
            return Err(ClientError::NotMessageAuthor);
        }

        self.edit_target = Some(target.id.clone());
        self.input = target.text.clone();
        self.reply_target = None;
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if self.edit_target.take().is_some() {
            self.input.clear();
        }
    }

    pub fn edit_target(&self) -> Option<&MessageId> {
        self.edit_target.as_ref()
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Validate the composition and flip the in-flight lock. Refusals are
    /// silent state checks, matching the disabled send button they mirror.
    fn begin_send(&mut self) -> Result<PendingSend> {
        if self.input.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let Some(user) = self.user.clone() else {
            return Err(ClientError::NotSignedIn);
        };
        if self.sending {
            return Err(ClientError::SendInFlight);
        }

        self.sending = true;
        Ok(PendingSend {
            user,
            text: self.input.clone(),
            reply: self.reply_target.clone(),
            edit: self.edit_target.clone(),
        })
    }

    /// Submit the composition: a new message, or an in-place update when an
    /// edit is armed. Success clears the composition and snaps the viewport
    /// to the latest message; failure preserves it for a manual retry.
    pub async fn submit(&mut self) -> Result<Message> {
        let pending = self.begin_send()?;

        let result = match &pending.edit {
            Some(id) => self.store.edit_message(&self.post_id, id, &pending.text).await,
            None => {
                self.store
                    .add_message(
                        &self.post_id,
                        &pending.user.uid,
                        &pending.user.email,
                        &pending.user.sender_name(),
                        &pending.text,
                        pending.reply.as_ref(),
                    )
                    .await
            }
        };
        self.sending = false;

        match result {
            Ok(message) => {
                self.input.clear();
                self.reply_target = None;
                self.edit_target = None;
                self.typing_until = None;
                self.scroll_offset_px = 0;
                Ok(message)
            }
            Err(e) => {
                tracing::error!(post = %self.post_id, error = %e, "send failed");
                self.notices
                    .error("Could not send the message. Please try again.");
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Record how far above the latest message the viewport sits.
    pub fn set_scroll_offset(&mut self, px: u32) {
        self.scroll_offset_px = px;
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset_px
    }

    /// Whether the jump-to-latest affordance should be shown.
    pub fn shows_jump_to_latest(&self) -> bool {
        self.scroll_offset_px > JUMP_TO_LATEST_THRESHOLD_PX
    }

    pub fn jump_to_latest(&mut self) {
        self.scroll_offset_px = 0;
    }
}
