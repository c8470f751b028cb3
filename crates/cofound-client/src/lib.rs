//! Headless client views for the cofound desktop app.
//!
//! Each module owns one screen's worth of state: the data a renderer needs,
//! the mutations the screen performs, and the notices it raises. Nothing in
//! here draws; a UI layer binds to these types and re-renders on change.
//!
//! The live pieces (the conversation thread, the owner's conversation list,
//! the session signal) ride on [`cofound_store`]'s feeds and watch channels;
//! everything else is fetch-on-demand.

pub mod conversation;
pub mod conversations;
pub mod directory;
mod error;
pub mod guard;
pub mod network;
pub mod notices;
pub mod plans;
pub mod posting;
pub mod profile;
pub mod session;
pub mod settings;

pub use error::{ClientError, Result};
pub use notices::{Notice, NoticeLevel, NoticeSink};
pub use session::{Session, SessionUser};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide tracing subscriber. Call once at startup;
/// `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cofound_client=debug,cofound_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
