//! End-to-end conversation flows over a shared in-memory store.
//!
//! Scenarios:
//! - A joiner messages a post, the owner's conversation list picks the
//!   dialog up, and the owner's reply reaches the joiner's live view.
//! - Two joiners write under the same post and the owner's per-dialog
//!   views keep them apart.
//! - An in-place edit is re-delivered to every open view of the thread.

use cofound_client::conversation::{ConversationView, Phase};
use cofound_client::conversations::ConversationList;
use cofound_client::posting::{self, PostDraft};
use cofound_client::{plans, NoticeSink, Session, SessionUser};
use cofound_shared::types::{Role, UserId};
use cofound_store::{Post, Store};

fn draft(name: &str) -> PostDraft {
    PostDraft {
        name: name.into(),
        description: "Prefabricated solar kits for rural households".into(),
        stage: "MVP".into(),
        ..PostDraft::default()
    }
}

/// Sign an owner up, select a plan, and publish one post.
async fn owner_with_post(store: &Store, name: &str) -> (SessionUser, Post) {
    let notices = NoticeSink::default();
    let session = Session::new(store.clone());
    let owner = session
        .sign_up("owner@example.com", "hunter22", Some("Priya"), Role::Poster)
        .await
        .unwrap();
    plans::select_plan(store, &notices, &owner.user, Role::Poster, "Starter Poster")
        .await
        .unwrap();
    let post = posting::create_post(store, &notices, &owner.user, draft(name))
        .await
        .unwrap();
    (owner, post)
}

fn texts(view: &ConversationView) -> Vec<String> {
    view.visible().iter().map(|m| m.text.clone()).collect()
}

// ============================================================
// Scenario 1: joiner writes, owner's sidebar and reply flow
// ============================================================

#[tokio::test]
async fn a_joiner_message_reaches_the_owner_and_the_reply_comes_back() {
    let store = Store::open_in_memory().unwrap();
    let (owner, post) = owner_with_post(&store, "Solar Kits").await;

    let joiner_session = Session::new(store.clone());
    let joiner = joiner_session
        .sign_up("dev@example.com", "hunter22", Some("Arjun"), Role::Joiner)
        .await
        .unwrap();

    // The joiner opens the thread from the directory: full thread, no
    // counterpart filter.
    let mut joiner_view =
        ConversationView::new(store.clone(), NoticeSink::default(), post.id.clone(), None);
    joiner_view.set_user(Some(joiner.user.clone()));
    joiner_view.activate().await;
    assert!(joiner_view.next_delivery().await, "initial snapshot");
    assert_eq!(joiner_view.phase(), Phase::Ready);

    joiner_view.set_input("Hi! I can build the firmware.");
    joiner_view.submit().await.unwrap();
    assert!(joiner_view.next_delivery().await);
    assert_eq!(joiner_view.visible().len(), 1);

    // The owner's sidebar aggregates the new counterpart and auto-selects it.
    let list = ConversationList::open(store.clone(), owner.user.clone()).await;
    let entry = list.selected().expect("one conversation").clone();
    assert_eq!(entry.post_id, post.id);
    assert_eq!(entry.post_title, "Solar Kits");
    assert_eq!(entry.counterpart, "dev@example.com");

    // The owner replies inside the two-party dialog.
    let mut owner_view = ConversationView::new(
        store.clone(),
        NoticeSink::default(),
        entry.post_id.clone(),
        Some(entry.counterpart.clone()),
    );
    owner_view.set_user(Some(owner.user.clone()));
    owner_view.activate().await;
    assert!(owner_view.next_delivery().await);
    assert_eq!(owner_view.visible().len(), 1);

    owner_view.set_input("Great, let's talk equity.");
    owner_view.submit().await.unwrap();
    assert!(owner_view.next_delivery().await);
    assert_eq!(owner_view.visible().len(), 2);

    // The joiner's open view receives the reply without any refetch.
    assert!(joiner_view.next_delivery().await);
    assert_eq!(
        texts(&joiner_view),
        vec!["Hi! I can build the firmware.", "Great, let's talk equity."]
    );
}

// ============================================================
// Scenario 2: two joiners, one post, separate owner dialogs
// ============================================================

#[tokio::test]
async fn owner_dialogs_keep_two_joiners_apart() {
    let store = Store::open_in_memory().unwrap();
    let (owner, post) = owner_with_post(&store, "Drone Delivery").await;

    store
        .add_message(&post.id, &UserId::new(), "asha@example.com", "Asha", "From Asha", None)
        .await
        .unwrap();
    store
        .add_message(&post.id, &UserId::new(), "bilal@example.com", "Bilal", "From Bilal", None)
        .await
        .unwrap();

    // Dialog with Asha: Bilal's message must not appear.
    let mut view = ConversationView::new(
        store.clone(),
        NoticeSink::default(),
        post.id.clone(),
        Some("asha@example.com".into()),
    );
    view.set_user(Some(owner.user.clone()));
    view.activate().await;
    assert!(view.next_delivery().await);
    assert_eq!(texts(&view), vec!["From Asha"]);

    view.set_input("Reply meant for Asha");
    view.submit().await.unwrap();
    assert!(view.next_delivery().await);
    assert_eq!(texts(&view), vec!["From Asha", "Reply meant for Asha"]);

    // Switching the dialog to Bilal hides Asha's side. The owner's own
    // replies are not tagged per dialog, so they stay visible everywhere.
    view.retarget(post.id.clone(), Some("bilal@example.com".into()))
        .await;
    assert!(view.next_delivery().await);
    assert_eq!(texts(&view), vec!["From Bilal", "Reply meant for Asha"]);

    // A joiner reading the same thread is not filtered at all.
    let mut asha_view =
        ConversationView::new(store.clone(), NoticeSink::default(), post.id.clone(), None);
    asha_view.set_user(Some(cofound_store::AuthUser {
        uid: UserId::new(),
        email: "asha@example.com".into(),
        display_name: Some("Asha".into()),
    }));
    asha_view.activate().await;
    assert!(asha_view.next_delivery().await);
    assert_eq!(asha_view.visible().len(), 3);
}

// ============================================================
// Scenario 3: live in-place edits
// ============================================================

#[tokio::test]
async fn edits_are_redelivered_to_every_open_view() {
    let store = Store::open_in_memory().unwrap();
    let (_owner, post) = owner_with_post(&store, "Night Market").await;

    let joiner_session = Session::new(store.clone());
    let joiner = joiner_session
        .sign_up("dev@example.com", "hunter22", Some("Arjun"), Role::Joiner)
        .await
        .unwrap();

    let mut author_view =
        ConversationView::new(store.clone(), NoticeSink::default(), post.id.clone(), None);
    author_view.set_user(Some(joiner.user.clone()));
    author_view.activate().await;
    assert!(author_view.next_delivery().await);

    // A read-only bystander view with no signed-in user.
    let mut watcher_view =
        ConversationView::new(store.clone(), NoticeSink::default(), post.id.clone(), None);
    watcher_view.activate().await;
    assert!(watcher_view.next_delivery().await);
    assert!(!watcher_view.input_enabled());

    author_view.set_input("Let me fix the typo massage");
    let original = author_view.submit().await.unwrap();
    assert!(!original.edited);
    assert!(author_view.next_delivery().await);
    assert!(watcher_view.next_delivery().await);

    author_view.arm_edit(&original).unwrap();
    assert_eq!(author_view.input(), "Let me fix the typo massage");
    author_view.set_input("Let me fix the typo message");
    author_view.submit().await.unwrap();

    assert!(author_view.next_delivery().await);
    assert!(watcher_view.next_delivery().await);

    for view in [&author_view, &watcher_view] {
        let visible = view.visible();
        assert_eq!(visible.len(), 1, "edit replaces, never appends");
        assert_eq!(visible[0].id, original.id);
        assert_eq!(visible[0].created_at, original.created_at);
        assert_eq!(visible[0].text, "Let me fix the typo message");
        assert!(visible[0].edited);
    }
}
