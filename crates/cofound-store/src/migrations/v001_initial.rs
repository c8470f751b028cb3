//! v001 -- Initial schema creation.
//!
//! Creates the document collections (`users`, `posts`, `messages`), the
//! connection link table, the auth credential table, and the client-local
//! `preferences` table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (profile documents, keyed by auth uid)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4, same as auth uid
    email         TEXT NOT NULL UNIQUE,
    display_name  TEXT,
    role          TEXT NOT NULL,              -- 'poster' | 'joiner'
    plan          TEXT,                       -- plan name, NULL until selected
    plan_selected INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    gender        TEXT,
    headline      TEXT,
    bio           TEXT,
    skills        TEXT,                       -- comma-separated
    education     TEXT NOT NULL DEFAULT '[]', -- JSON list
    experience    TEXT NOT NULL DEFAULT '[]', -- JSON list
    created_at    TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    last_updated  TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Connection links (one row per directed edge per list kind)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_links (
    user_id  TEXT NOT NULL,                   -- FK -> users(id)
    kind     TEXT NOT NULL,                   -- 'connection' | 'pending' | 'received' | 'following'
    peer_id  TEXT NOT NULL,                   -- FK -> users(id)
    added_at TEXT NOT NULL,

    PRIMARY KEY (user_id, kind, peer_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (peer_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_user_links_user ON user_links(user_id, kind);

-- ----------------------------------------------------------------
-- Posts (startup ideas)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    uid           TEXT NOT NULL,              -- FK -> users(id), the owner
    email         TEXT NOT NULL,              -- owner email, denormalized
    posted_by     TEXT,                       -- owner display name at post time
    name          TEXT NOT NULL,
    tagline       TEXT,
    description   TEXT NOT NULL,
    industry      TEXT,
    stage         TEXT,
    skills_needed TEXT,
    location      TEXT,
    budget        TEXT,
    timeline      TEXT,
    team_size     TEXT,
    is_remote     INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    experience    TEXT,
    equity        TEXT,
    plan_used     TEXT,
    status        TEXT NOT NULL DEFAULT 'active',
    views         INTEGER NOT NULL DEFAULT 0,
    likes         INTEGER NOT NULL DEFAULT 0,
    liked_by      TEXT NOT NULL DEFAULT '[]', -- JSON list of user ids
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,

    FOREIGN KEY (uid) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_uid ON posts(uid);
CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC);

-- ----------------------------------------------------------------
-- Messages (sub-collection of posts)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    post_id     TEXT NOT NULL,                -- FK -> posts(id)
    text        TEXT NOT NULL,
    sender      TEXT NOT NULL,                -- sender email
    sender_uid  TEXT NOT NULL,
    sender_name TEXT NOT NULL,
    created_at  TEXT NOT NULL,                -- server-assigned, fixed precision
    reply_to    TEXT,                         -- JSON {sender, text}, nullable
    edited      INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    reactions   TEXT NOT NULL DEFAULT '[]',   -- JSON list

    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_post_created
    ON messages(post_id, created_at ASC);

-- ----------------------------------------------------------------
-- Auth credentials (separate facility from the profile documents)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS auth_credentials (
    uid           TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    email         TEXT NOT NULL UNIQUE,
    display_name  TEXT,
    password_hash TEXT NOT NULL,              -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Preferences (client-local key/value, not part of the document contract)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS preferences (
    user_id TEXT NOT NULL,
    key     TEXT NOT NULL,
    value   TEXT NOT NULL,                    -- JSON

    PRIMARY KEY (user_id, key)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
