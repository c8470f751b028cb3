use std::time::Duration;

/// Application name
pub const APP_NAME: &str = "cofound";

/// How long the typing indicator stays lit after the last keystroke.
/// Purely local; nothing is transmitted.
pub const TYPING_INDICATOR_TTL: Duration = Duration::from_millis(1000);

/// Scroll distance from the latest message (in pixels) beyond which the
/// jump-to-latest affordance appears.
pub const JUMP_TO_LATEST_THRESHOLD_PX: u32 = 200;

/// Number of posts shown in the recent-ideas panel of the posting view.
pub const RECENT_POSTS_LIMIT: u32 = 3;

/// Stage ladder used for stage-ordered directory sorting. Posts whose
/// stage is not listed sort after all known stages.
pub const STAGE_ORDER: &[&str] = &[
    "Idea",
    "Research",
    "MVP",
    "Beta",
    "Launched",
    "Growing",
    "Scaling",
];
