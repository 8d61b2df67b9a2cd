use rusqlite::ErrorCode;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by the account, record and session stores.
///
/// Every variant is recoverable at the IPC boundary; [`StoreError::code`] is
/// the stable string the UI switches on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an account already exists for {0}")]
    DuplicateAccount(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("no account found for {0}")]
    UnknownEmail(String),
    #[error("stored data is corrupt: {0}")]
    StorageCorrupt(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("database error: {0}")]
    Db(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateAccount(_) => "duplicate_account",
            Self::InvalidCredentials => "invalid_credentials",
            Self::UnknownEmail(_) => "unknown_email",
            Self::StorageCorrupt(_) => "storage_corrupt",
            Self::Hashing(_) => "hash_failed",
            Self::Db(_) => "db_error",
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::StorageCorrupt(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        // Rows that no longer decode into their declared types are data loss,
        // not an ordinary query failure.
        match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if matches!(f.code, ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase) =>
            {
                Self::StorageCorrupt(e.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => Self::StorageCorrupt(e.to_string()),
            _ => Self::Db(e),
        }
    }
}

pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == ErrorCode::ConstraintViolation
                && f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
