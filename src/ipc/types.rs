use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::identity::CredentialHasher;
use crate::roster::StudentDirectory;
use crate::session::SessionUser;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything a handler may touch. `session` mirrors the row persisted by
/// `session::store` while a workspace is open.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: Option<SessionUser>,
    pub hasher: CredentialHasher,
    pub directory: Box<dyn StudentDirectory>,
}

impl AppState {
    pub fn new(hasher: CredentialHasher, directory: Box<dyn StudentDirectory>) -> Self {
        Self {
            workspace: None,
            db: None,
            session: None,
            hasher,
            directory,
        }
    }
}
