//! Profile editing: merge-style saves of the signed-in user's document and
//! read-only lookups of other users.

use cofound_shared::types::UserId;
use cofound_store::{AuthUser, ProfileUpdate, Store, StoreError, User};

use crate::error::Result;
use crate::notices::NoticeSink;

/// The signed-in user's profile document, `None` when it has not been
/// created yet.
pub async fn load_profile(store: &Store, user: &AuthUser) -> Result<Option<User>> {
    public_profile(store, &user.uid).await
}

/// Merge `update` into the signed-in user's document. Unset fields keep
/// their stored values; the section lists replace wholesale when present.
pub async fn save_profile(
    store: &Store,
    notices: &NoticeSink,
    user: &AuthUser,
    update: &ProfileUpdate,
) -> Result<User> {
    match store.update_profile(&user.uid, update).await {
        Ok(saved) => {
            notices.success("Profile saved successfully!");
            Ok(saved)
        }
        Err(e) => {
            tracing::error!(error = %e, "profile save failed");
            notices.error(format!("Error saving profile: {e}"));
            Err(e.into())
        }
    }
}

/// A user's profile for the read-only view, `None` when the document does
/// not exist.
pub async fn public_profile(store: &Store, id: &UserId) -> Result<Option<User>> {
    match store.get_user(id).await {
        Ok(profile) => Ok(Some(profile)),
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
