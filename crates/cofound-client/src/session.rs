//! Session state: the signed-in identity plus the role chosen at sign-in.
//!
//! The role belongs to the session, not the account. It is picked again at
//! every sign-in, and role-gated views compare against it rather than
//! whatever the profile document happened to record at sign-up. Signing up,
//! signing in and signing out are the only places the session changes.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use cofound_shared::types::Role;
use cofound_store::{Auth, AuthUser, Store};

use crate::error::Result;

/// The signed-in identity and this session's role.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user: AuthUser,
    pub role: Role,
}

/// One client session over a shared store. Cheap to clone; all clones share
/// the same signed-in state.
#[derive(Clone)]
pub struct Session {
    store: Store,
    auth: Auth,
    current: Arc<watch::Sender<Option<SessionUser>>>,
}

impl Session {
    pub fn new(store: Store) -> Self {
        let auth = Auth::new(store.clone());
        let (current, _) = watch::channel(None);
        Self {
            store,
            auth,
            current: Arc::new(current),
        }
    }

    /// Register an account, create its profile document, and start the
    /// session under `role`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> Result<SessionUser> {
        let user = self.auth.sign_up(email, password, display_name).await?;

        if let Err(e) = self
            .store
            .create_user_profile(&user.uid, &user.email, user.display_name.as_deref(), role)
            .await
        {
            // Half-created accounts must not look signed in.
            self.auth.sign_out();
            return Err(e.into());
        }

        let session_user = SessionUser { user, role };
        tracing::info!(uid = %session_user.user.uid, role = %role, "session started");
        self.current.send_replace(Some(session_user.clone()));
        Ok(session_user)
    }

    /// Sign in to an existing account, choosing this session's role.
    pub async fn sign_in(&self, email: &str, password: &str, role: Role) -> Result<SessionUser> {
        let user = self.auth.sign_in(email, password).await?;

        let session_user = SessionUser { user, role };
        tracing::info!(uid = %session_user.user.uid, role = %role, "session started");
        self.current.send_replace(Some(session_user.clone()));
        Ok(session_user)
    }

    /// End the session. Idempotent.
    pub fn sign_out(&self) {
        self.auth.sign_out();
        self.current.send_replace(None);
    }

    /// The session's user, if signed in.
    pub fn current(&self) -> Option<SessionUser> {
        self.current.borrow().clone()
    }

    /// Subscribe to session transitions. The receiver sees the value at
    /// subscription time plus every later change.
    pub fn watch(&self) -> watch::Receiver<Option<SessionUser>> {
        self.current.subscribe()
    }

    /// Replace the identity half of the session after an account update,
    /// keeping the role.
    pub(crate) fn refresh_identity(&self, user: AuthUser) {
        self.current.send_if_modified(|slot| match slot {
            Some(session_user) => {
                session_user.user = user;
                true
            }
            None => false,
        });
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }
}
