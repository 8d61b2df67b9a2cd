use crate::db;
use crate::error::StoreError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "schemaVersion": db::SCHEMA_VERSION,
            "signedIn": state.session.is_some(),
        }),
    )
}

/// Opens (or creates) the workspace database and restores any saved session.
/// On failure the previously open workspace stays selected.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    let restored = session::load(&conn)?;

    tracing::info!(
        workspace = %path.to_string_lossy(),
        session_restored = restored.is_some(),
        "workspace opened"
    );
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.session = restored;
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(()) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "session": state.session,
            }),
        ),
        Err(e) => {
            tracing::error!(workspace = %path.to_string_lossy(), error = %format!("{e:#}"), "workspace open failed");
            let code = match e.downcast_ref::<StoreError>() {
                Some(se @ StoreError::StorageCorrupt(_)) => se.code(),
                _ => "db_open_failed",
            };
            err(&req.id, code, format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
