use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// JSON column (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// The shared database mutex was poisoned by a panicking thread.
    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Errors produced by the auth facility.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The email is already registered.
    #[error("Email already in use")]
    EmailTaken,

    /// No account for that email, or the password did not match.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Password failed the minimum-strength check.
    #[error("Password must be at least 6 characters")]
    WeakPassword,

    /// An operation that needs a signed-in user ran without one.
    #[error("Not signed in")]
    NotSignedIn,

    /// Password hashing / verification failure.
    #[error("Password hash error: {0}")]
    Hash(String),

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
