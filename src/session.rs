use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::identity::{Identity, Role};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

const SESSION_KEY: &str = "session.current";

/// The signed-in account as the UI sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for SessionUser {
    fn from(i: Identity) -> Self {
        Self {
            id: i.id,
            name: i.name,
            email: i.email,
            role: i.role,
        }
    }
}

pub fn store(conn: &Connection, user: &SessionUser) -> StoreResult<()> {
    let value = serde_json::to_value(user).map_err(|e| StoreError::corrupt(e.to_string()))?;
    db::settings_set_json(conn, SESSION_KEY, &value)
}

pub fn load(conn: &Connection) -> StoreResult<Option<SessionUser>> {
    let Some(value) = db::settings_get_json(conn, SESSION_KEY)? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| StoreError::corrupt(format!("saved session: {e}")))
}

pub fn clear(conn: &Connection) -> StoreResult<()> {
    db::settings_delete(conn, SESSION_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> SessionUser {
        SessionUser {
            id: "u1".into(),
            name: "ASHA".into(),
            email: "asha@college.edu".into(),
            role: Role::Teacher,
        }
    }

    #[test]
    fn store_load_clear_lifecycle() {
        let conn = db::open_in_memory();
        assert_eq!(load(&conn).unwrap(), None);

        store(&conn, &user()).unwrap();
        assert_eq!(load(&conn).unwrap(), Some(user()));

        clear(&conn).unwrap();
        assert_eq!(load(&conn).unwrap(), None);
    }

    #[test]
    fn stored_session_has_no_password_field() {
        let conn = db::open_in_memory();
        store(&conn, &user()).unwrap();
        let raw = db::settings_get_json(&conn, SESSION_KEY).unwrap().unwrap();
        assert_eq!(
            raw,
            json!({ "id": "u1", "name": "ASHA", "email": "asha@college.edu", "role": "TEACHER" })
        );
    }

    #[test]
    fn malformed_session_is_corruption() {
        let conn = db::open_in_memory();
        db::settings_set_json(&conn, SESSION_KEY, &json!({ "id": 7 })).unwrap();
        assert_eq!(load(&conn).unwrap_err().code(), "storage_corrupt");
    }
}
