//! # cofound-shared
//!
//! Domain types shared by every cofound crate: identifier newtypes, the
//! account [`Role`](types::Role), the subscription plan catalog, and the
//! behavioral constants the client views depend on.
//!
//! This crate is deliberately free of IO; everything here is plain data.

pub mod constants;
pub mod plans;
pub mod types;

pub use plans::{plans_for_role, post_limit, PlanTier, PostLimit};
pub use types::{MessageId, PostId, Role, RoleParseError, UserId};
