use thiserror::Error;

use cofound_store::{AuthError, StoreError};

/// Errors surfaced by the client views.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Store-layer failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Auth-layer failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An operation that needs a signed-in user ran without one.
    #[error("Not signed in")]
    NotSignedIn,

    /// Message text was empty or whitespace-only.
    #[error("Message text is empty")]
    EmptyMessage,

    /// A send was requested while a previous one is still pending.
    #[error("A send is already in flight")]
    SendInFlight,

    /// Only the author of a message may edit it.
    #[error("Only your own messages can be edited")]
    NotMessageAuthor,

    /// The current plan does not allow another post.
    #[error("The {plan} plan allows {limit} active post(s)")]
    PostLimitReached { plan: String, limit: u32 },

    /// Caller-supplied input failed validation.
    #[error("{0}")]
    Invalid(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
