//! The find-partners view: browse other users, send connection requests,
//! and accept received ones.

use cofound_shared::types::UserId;
use cofound_store::{AuthUser, Store, StoreError, User};

use crate::error::Result;
use crate::notices::NoticeSink;

/// Network view state for one signed-in user.
pub struct NetworkView {
    store: Store,
    notices: NoticeSink,
    user: AuthUser,
    users: Vec<User>,
    profile: Option<User>,
}

impl NetworkView {
    pub fn new(store: Store, notices: NoticeSink, user: AuthUser) -> Self {
        Self {
            store,
            notices,
            user,
            users: Vec::new(),
            profile: None,
        }
    }

    /// Fetch everyone except the viewer, plus the viewer's own profile
    /// document (absent profiles leave the link lists empty).
    pub async fn load(&mut self) -> Result<()> {
        let mut users = self.store.list_users().await?;
        users.retain(|u| u.id != self.user.uid);
        self.users = users;

        self.profile = match self.store.get_user(&self.user.uid).await {
            Ok(profile) => Some(profile),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
    }

    /// Users whose requests await the viewer's acceptance.
    pub fn received_requests(&self) -> Vec<&User> {
        self.linked(|p| &p.received_requests)
    }

    /// Accepted connections as user objects.
    pub fn connection_users(&self) -> Vec<&User> {
        self.linked(|p| &p.connections)
    }

    /// Users shown in the browse list: everyone whose request is not
    /// already sitting in the received section.
    pub fn browsable_users(&self) -> Vec<&User> {
        let Some(profile) = &self.profile else {
            return self.users.iter().collect();
        };
        self.users
            .iter()
            .filter(|u| !profile.received_requests.contains(&u.id))
            .collect()
    }

    fn linked(&self, pick: fn(&User) -> &Vec<UserId>) -> Vec<&User> {
        let Some(profile) = &self.profile else {
            return Vec::new();
        };
        let ids = pick(profile);
        self.users.iter().filter(|u| ids.contains(&u.id)).collect()
    }

    /// Whether a request to `target` is outstanding.
    pub fn is_pending(&self, target: &UserId) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.pending_connections.contains(target))
    }

    pub fn is_connected(&self, target: &UserId) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.connections.contains(target))
    }

    /// Send a connection request and refresh the viewer's profile.
    pub async fn connect(&mut self, target: &UserId) -> Result<()> {
        self.store
            .send_connection_request(&self.user.uid, target)
            .await?;
        self.profile = Some(self.store.get_user(&self.user.uid).await?);
        self.notices.success("Connection request sent!");
        Ok(())
    }

    /// Accept a received request and refresh the viewer's profile.
    pub async fn accept(&mut self, requester: &UserId) -> Result<()> {
        self.store
            .accept_connection_request(&self.user.uid, requester)
            .await?;
        self.profile = Some(self.store.get_user(&self.user.uid).await?);
        self.notices.success("Connection accepted!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cofound_shared::types::Role;
    use cofound_store::Store;

    use crate::notices::NoticeLevel;

    use super::*;

    async fn seed_user(store: &Store, email: &str, name: &str) -> AuthUser {
        let user = AuthUser {
            uid: UserId::new(),
            email: email.into(),
            display_name: Some(name.into()),
        };
        store
            .create_user_profile(&user.uid, &user.email, Some(name), Role::Joiner)
            .await
            .unwrap();
        user
    }

    async fn view_for(store: &Store, user: &AuthUser) -> NetworkView {
        let mut view = NetworkView::new(store.clone(), NoticeSink::default(), user.clone());
        view.load().await.unwrap();
        view
    }

    #[tokio::test]
    async fn load_excludes_the_viewer() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com", "Ada").await;
        seed_user(&store, "bob@example.com", "Bob").await;

        let view = view_for(&store, &ada).await;
        assert_eq!(view.users().len(), 1);
        assert_eq!(view.users()[0].email, "bob@example.com");
        assert_eq!(view.profile().unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn connect_marks_the_target_pending_and_notifies() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com", "Ada").await;
        let bob = seed_user(&store, "bob@example.com", "Bob").await;

        let mut view = view_for(&store, &ada).await;
        assert!(!view.is_pending(&bob.uid));

        view.connect(&bob.uid).await.unwrap();
        assert!(view.is_pending(&bob.uid));
        assert!(!view.is_connected(&bob.uid));

        let notices = view.notices.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].message, "Connection request sent!");
    }

    #[tokio::test]
    async fn accept_makes_the_connection_mutual() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com", "Ada").await;
        let bob = seed_user(&store, "bob@example.com", "Bob").await;

        let mut ada_view = view_for(&store, &ada).await;
        ada_view.connect(&bob.uid).await.unwrap();

        let mut bob_view = view_for(&store, &bob).await;
        let requests = bob_view.received_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].email, "ada@example.com");

        bob_view.accept(&ada.uid).await.unwrap();
        assert!(bob_view.received_requests().is_empty());
        assert!(bob_view.is_connected(&ada.uid));
        assert_eq!(bob_view.connection_users()[0].email, "ada@example.com");

        // The requester side sees the same link after a reload.
        ada_view.load().await.unwrap();
        assert!(ada_view.is_connected(&bob.uid));
        assert!(!ada_view.is_pending(&bob.uid));
        assert!(ada_view.profile().unwrap().following.contains(&bob.uid));
    }

    #[tokio::test]
    async fn browsable_list_hides_users_in_the_received_section() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com", "Ada").await;
        let bob = seed_user(&store, "bob@example.com", "Bob").await;
        seed_user(&store, "eve@example.com", "Eve").await;

        let mut bob_view = view_for(&store, &bob).await;
        bob_view.connect(&ada.uid).await.unwrap();

        let mut ada_view = view_for(&store, &ada).await;
        ada_view.load().await.unwrap();

        let browsable: Vec<&str> = ada_view
            .browsable_users()
            .iter()
            .map(|u| u.email.as_str())
            .collect();
        assert!(!browsable.contains(&"bob@example.com"));
        assert!(browsable.contains(&"eve@example.com"));
        assert_eq!(ada_view.received_requests().len(), 1);
    }
}
