use crate::identity::{self, Role};
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{require_db, required_str};
use crate::ipc::types::{AppState, Request};
use crate::session::{self, SessionUser};
use serde_json::json;

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let (name, email, password, role) = match (
        required_str(req, "name"),
        required_str(req, "email"),
        required_str(req, "password"),
        required_str(req, "role"),
    ) {
        (Ok(n), Ok(e), Ok(p), Ok(r)) => (n.trim(), e.trim(), p, r),
        (Err(resp), _, _, _) | (_, Err(resp), _, _) | (_, _, Err(resp), _) | (_, _, _, Err(resp)) => {
            return resp
        }
    };
    let Some(role) = Role::parse(role) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown role: {role}"),
            Some(json!({ "allowed": ["ADMIN", "TEACHER", "STUDENT"] })),
        );
    };

    match identity::register(conn, &state.hasher, name, email, password, role) {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let email = match required_str(req, "email") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let user = match identity::authenticate(conn, &state.hasher, email, password) {
        Ok(i) => SessionUser::from(i),
        Err(e) => return store_err(&req.id, &e),
    };
    if let Err(e) = session::store(conn, &user) {
        return store_err(&req.id, &e);
    }
    state.session = Some(user.clone());
    ok(&req.id, json!({ "user": user }))
}

fn handle_reset_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };

    match identity::request_password_reset(conn, email) {
        Ok(notice) => ok(
            &req.id,
            json!({
                "email": notice.email,
                "message": notice.message,
                "delivered": notice.delivered,
            }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if let Err(e) = session::clear(conn) {
        return store_err(&req.id, &e);
    }
    let was_signed_in = state.session.take();
    if let Some(u) = &was_signed_in {
        tracing::info!(account_id = %u.id, "signed out");
    }
    ok(&req.id, json!({ "loggedOut": was_signed_in.is_some() }))
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "user": state.session }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(handle_register(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        "auth.resetPassword" => Some(handle_reset_password(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        _ => None,
    }
}
