//! Email/password authentication backed by the `auth_credentials` table.
//!
//! Passwords are stored as argon2 PHC strings and never leave this module.
//! Sign-in state is process-local: an [`Auth`] handle owns a watch channel
//! that views subscribe to, and signing up, signing in and signing out are
//! its only mutation points.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio::sync::watch;

use cofound_shared::types::UserId;

use crate::database::Database;
use crate::error::{AuthError, Result};
use crate::models::AuthUser;
use crate::store::Store;

/// Minimum accepted password length, in characters.
const MIN_PASSWORD_LEN: usize = 6;

struct CredentialRow {
    uid: UserId,
    email: String,
    display_name: Option<String>,
    password_hash: String,
}

impl CredentialRow {
    fn auth_user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl Database {
    fn insert_credential(&self, row: &CredentialRow) -> Result<()> {
        self.conn().execute(
            "INSERT INTO auth_credentials (uid, email, display_name, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.uid.to_string(),
                row.email,
                row.display_name,
                row.password_hash,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_credential_by_email(&self, email: &str) -> Result<Option<CredentialRow>> {
        self.conn()
            .query_row(
                "SELECT uid, email, display_name, password_hash
                 FROM auth_credentials WHERE email = ?1",
                params![email],
                row_to_credential,
            )
            .optional()
            .map_err(Into::into)
    }

    fn set_credential_password(&self, uid: &UserId, password_hash: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE auth_credentials SET password_hash = ?2 WHERE uid = ?1",
            params![uid.to_string(), password_hash],
        )?;
        Ok(())
    }

    fn set_credential_display_name(&self, uid: &UserId, display_name: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE auth_credentials SET display_name = ?2 WHERE uid = ?1",
            params![uid.to_string(), display_name],
        )?;
        Ok(())
    }

    fn delete_credential(&self, uid: &UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM auth_credentials WHERE uid = ?1",
            params![uid.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_credential(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRow> {
    let uid: String = row.get(0)?;
    Ok(CredentialRow {
        uid: UserId::parse(&uid).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Handle to the authentication facility. Cheap to clone; all clones share
/// the same signed-in state.
#[derive(Clone)]
pub struct Auth {
    store: Store,
    current: Arc<watch::Sender<Option<AuthUser>>>,
}

impl Auth {
    /// Create an auth facility over a store. Starts signed out.
    pub fn new(store: Store) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            store,
            current: Arc::new(current),
        }
    }

    /// Register a new account and sign it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let email = email.trim().to_lowercase();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let row = CredentialRow {
            uid: UserId::new(),
            email,
            display_name: display_name.map(str::to_string),
            password_hash: hash_password(password)?,
        };

        // Uniqueness check and insert under one lock acquisition.
        let user = self.store.with_db(|db| {
            if db.get_credential_by_email(&row.email)?.is_some() {
                return Err(AuthError::EmailTaken);
            }
            db.insert_credential(&row)?;
            Ok(row.auth_user())
        })?;

        tracing::info!(uid = %user.uid, "account created");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.trim().to_lowercase();
        let row = self
            .store
            .with_db(|db| db.get_credential_by_email(&email))?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &row.password_hash)?;

        let user = row.auth_user();
        tracing::info!(uid = %user.uid, "signed in");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Clear the signed-in user. Idempotent.
    pub fn sign_out(&self) {
        if self.current.send_replace(None).is_some() {
            tracing::info!("signed out");
        }
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    /// Subscribe to sign-in state. The receiver sees the value at
    /// subscription time plus every later transition.
    pub fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }

    /// Replace the signed-in user's password.
    pub async fn change_password(&self, new_password: &str) -> Result<(), AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let hash = hash_password(new_password)?;
        self.store
            .with_db(|db| db.set_credential_password(&user.uid, &hash))?;
        tracing::info!(uid = %user.uid, "password changed");
        Ok(())
    }

    /// Update the display name on the signed-in account and republish the
    /// auth state so subscribed views pick it up.
    pub async fn update_display_name(&self, display_name: &str) -> Result<AuthUser, AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        self.store
            .with_db(|db| db.set_credential_display_name(&user.uid, display_name))?;

        let updated = AuthUser {
            display_name: Some(display_name.to_string()),
            ..user
        };
        self.current.send_replace(Some(updated.clone()));
        Ok(updated)
    }

    /// Delete the signed-in account's credentials and sign out. Profile
    /// documents are removed separately by the settings flow.
    pub async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        self.store.with_db(|db| db.delete_credential(&user.uid))?;
        self.current.send_replace(None);
        tracing::info!(uid = %user.uid, "account deleted");
        Ok(())
    }
}
