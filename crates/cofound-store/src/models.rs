//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer. Serialized field names use camelCase because
//! that is the document contract shared with other clients of the same
//! backend (`senderUid`, `replyTo`, `planSelected`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cofound_shared::types::{MessageId, PostId, Role, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user profile document, keyed by the auth uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier; identical to the auth uid.
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    /// Which side of the matchmaking this account signed up for.
    pub role: Role,
    /// Selected plan name, `None` until the user picks one.
    pub plan: Option<String>,
    /// Whether a plan has ever been selected; gates role-protected views.
    pub plan_selected: bool,
    pub gender: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    /// Comma-separated skill list, free-form.
    pub skills: Option<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    /// Accepted connections, in the order they were added.
    pub connections: Vec<UserId>,
    /// Outgoing requests awaiting the other side's acceptance.
    pub pending_connections: Vec<UserId>,
    /// Incoming requests awaiting this user's acceptance.
    pub received_requests: Vec<UserId>,
    pub following: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// One education section entry on a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    pub duration: String,
    pub description: String,
}

/// One work-experience section entry on a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

/// Partial profile update; `None` fields are left unchanged (merge write).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub gender: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub education: Option<Vec<EducationEntry>>,
    pub experience: Option<Vec<ExperienceEntry>>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A published startup idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique post identifier.
    pub id: PostId,
    /// Owner's user id.
    pub uid: UserId,
    /// Owner's email, denormalized onto the post for counterpart filtering.
    pub email: String,
    /// Owner's display name at posting time.
    pub posted_by: Option<String>,
    /// Idea title.
    pub name: String,
    pub tagline: Option<String>,
    pub description: String,
    pub industry: Option<String>,
    pub stage: Option<String>,
    pub skills_needed: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub team_size: Option<String>,
    pub is_remote: bool,
    pub experience: Option<String>,
    pub equity: Option<String>,
    /// Plan the owner was on when posting.
    pub plan_used: Option<String>,
    pub status: String,
    pub views: i64,
    pub likes: i64,
    /// Users who currently like this post.
    pub liked_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post. The store assigns id, timestamps, status and
/// counters; everything else is caller-provided.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub uid: UserId,
    pub email: String,
    pub posted_by: Option<String>,
    pub name: String,
    pub tagline: Option<String>,
    pub description: String,
    pub industry: Option<String>,
    pub stage: Option<String>,
    pub skills_needed: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub team_size: Option<String>,
    pub is_remote: bool,
    pub experience: Option<String>,
    pub equity: Option<String>,
    pub plan_used: Option<String>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message under a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// The post this message belongs to.
    pub post_id: PostId,
    pub text: String,
    /// Sender email. May be empty in legacy data; consumers must tolerate it.
    pub sender: String,
    pub sender_uid: UserId,
    /// Display name shown next to the message.
    pub sender_name: String,
    /// Server-assigned send time, monotonically non-decreasing per post.
    pub created_at: DateTime<Utc>,
    /// Snapshot of the message being replied to, if any.
    pub reply_to: Option<ReplyPreview>,
    /// Whether the text has been edited after sending.
    pub edited: bool,
    /// Reaction strings. Persisted for contract compatibility; the views
    /// do not render them yet.
    pub reactions: Vec<String>,
}

/// The preview snapshot embedded in a replying message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    /// Email of the original sender.
    pub sender: String,
    /// Original text, captured at reply time.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// The signed-in identity handed out by the auth facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// The name shown on messages this user sends: the display name when
    /// set, otherwise the local part of the email address.
    pub fn sender_name(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(self.email.as_str())
                .to_string(),
        }
    }
}
