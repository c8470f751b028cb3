//! # cofound-store
//!
//! Local persistence for the cofound client: a SQLite-backed document store
//! holding user profiles, startup-idea posts and their per-post message
//! threads, plus the auth credential table and client-local preferences.
//!
//! The crate exposes three layers:
//!
//! - [`Database`]: a plain connection wrapper with typed CRUD helpers,
//!   migrations applied on open.
//! - [`Store`]: the cloneable async facade views hold. Writes publish
//!   [`Change`]s, and [`Store::subscribe_messages`] /
//!   [`Store::subscribe_owned_posts`] deliver full query snapshots on every
//!   relevant change.
//! - [`Auth`]: email/password accounts with argon2 hashes and a watchable
//!   sign-in state.

pub mod auth;
pub mod connections;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod preferences;
pub mod store;
pub mod users;

mod error;

pub use auth::Auth;
pub use database::Database;
pub use error::{AuthError, Result, StoreError};
pub use models::*;
pub use store::{Change, Feed, MessageFeed, PostFeed, Store};
