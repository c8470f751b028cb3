//! Account settings: display name, password, account deletion, and the
//! app-settings document persisted through preferences.

use serde::{Deserialize, Serialize};

use cofound_store::{AuthUser, StoreError};

use crate::error::{ClientError, Result};
use crate::notices::NoticeSink;
use crate::session::Session;

/// Preference key holding the serialized [`AppSettings`].
pub const SETTINGS_KEY: &str = "appSettings";

/// App-level settings, stored as one JSON document per user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub status: String,
    pub language: String,
    pub notifications: bool,
    pub privacy: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            status: String::new(),
            language: "en".into(),
            notifications: true,
            privacy: "public".into(),
        }
    }
}

/// Load the signed-in user's settings; a missing document yields defaults.
pub async fn load_settings(session: &Session) -> Result<AppSettings> {
    let user = session.current().ok_or(ClientError::NotSignedIn)?;
    match session
        .store()
        .get_preference(&user.user.uid, SETTINGS_KEY)
        .await?
    {
        Some(value) => Ok(serde_json::from_value(value).map_err(StoreError::Json)?),
        None => Ok(AppSettings::default()),
    }
}

/// Persist the settings document for the signed-in user.
pub async fn save_settings(session: &Session, settings: &AppSettings) -> Result<()> {
    let user = session.current().ok_or(ClientError::NotSignedIn)?;
    let value = serde_json::to_value(settings).map_err(StoreError::Json)?;
    session
        .store()
        .set_preference(&user.user.uid, SETTINGS_KEY, &value)
        .await?;
    Ok(())
}

/// Update the display name on the credential record and the profile
/// document, then refresh the session identity.
pub async fn update_display_name(
    session: &Session,
    notices: &NoticeSink,
    display_name: &str,
) -> Result<AuthUser> {
    match try_update_display_name(session, display_name).await {
        Ok(updated) => {
            notices.success("Profile updated!");
            Ok(updated)
        }
        Err(e) => {
            notices.error(format!("Error updating profile: {e}"));
            Err(e)
        }
    }
}

async fn try_update_display_name(session: &Session, display_name: &str) -> Result<AuthUser> {
    let updated = session.auth().update_display_name(display_name).await?;
    session
        .store()
        .set_display_name(&updated.uid, display_name)
        .await?;
    session.refresh_identity(updated.clone());
    Ok(updated)
}

/// Change the signed-in user's password.
pub async fn change_password(
    session: &Session,
    notices: &NoticeSink,
    new_password: &str,
) -> Result<()> {
    match session.auth().change_password(new_password).await {
        Ok(()) => {
            notices.success("Password updated!");
            Ok(())
        }
        Err(e) => {
            notices.error(format!("Error updating password: {e}"));
            Err(e.into())
        }
    }
}

/// Delete the signed-in user's account: the profile document goes first,
/// then the credentials. The session ends on success; a failure leaves
/// everything signed in so the user can retry.
pub async fn delete_account(session: &Session, notices: &NoticeSink) -> Result<()> {
    match try_delete_account(session).await {
        Ok(()) => {
            notices.success("Account deleted.");
            Ok(())
        }
        Err(e) => {
            notices.error(format!("Error deleting account: {e}"));
            Err(e)
        }
    }
}

async fn try_delete_account(session: &Session) -> Result<()> {
    let user = session.current().ok_or(ClientError::NotSignedIn)?;
    session.store().delete_user_profile(&user.user.uid).await?;
    session.auth().delete_account().await?;
    session.sign_out();
    Ok(())
}
