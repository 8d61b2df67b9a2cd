use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{require_db, required_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, ISSUE_TYPES, OTHER_ISSUE};
use serde_json::json;

/// UUCMS numbers are generated upper-case; search boxes are not.
fn normalize_uucms(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn handle_issue_types(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let issue_types: Vec<serde_json::Value> = ISSUE_TYPES
        .iter()
        .map(|t| json!({ "name": t, "reasonRequired": *t == OTHER_ISSUE }))
        .collect();
    ok(&req.id, json!({ "issueTypes": issue_types }))
}

fn handle_records_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let uucms_no = match required_str(req, "uucmsNo") {
        Ok(v) => normalize_uucms(v),
        Err(resp) => return resp,
    };
    let issue_type = match required_str(req, "issueType") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let reason = str_param(req, "reason").unwrap_or("").trim();

    // Default the reporter to whoever is signed in.
    let reported_by = match str_param(req, "reportedBy").map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => match state.session.as_ref() {
            Some(u) => u.name.clone(),
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "missing reportedBy and nobody is signed in",
                    None,
                )
            }
        },
    };

    match records::save_record(conn, &uucms_no, issue_type, reason, &reported_by) {
        Ok(record) => {
            let known = records::is_known_issue_type(&record.issue_type);
            ok(&req.id, json!({ "record": record, "knownIssueType": known }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_records_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    // Absent or blank means every student; any other non-string is a mistake,
    // not a request for everything.
    let uucms_no = match req.params.get("uucmsNo") {
        None => None,
        Some(serde_json::Value::String(s)) => Some(normalize_uucms(s)).filter(|u| !u.is_empty()),
        Some(other) => {
            return err(
                &req.id,
                "bad_params",
                format!("uucmsNo must be a string, got {other}"),
                None,
            )
        }
    };
    let recent_first = match str_param(req, "order") {
        None | Some("stored") => false,
        Some("recent") => true,
        Some(other) => {
            return err(
                &req.id,
                "bad_params",
                format!("unknown order: {other}"),
                Some(json!({ "allowed": ["stored", "recent"] })),
            )
        }
    };

    match records::get_records(conn, uucms_no.as_deref()) {
        Ok(list) => {
            let list = if recent_first {
                records::most_recent_first(list)
            } else {
                list
            };
            ok(&req.id, json!({ "records": list }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_count_by_issue_type(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let uucms_no = match required_str(req, "uucmsNo") {
        Ok(v) => normalize_uucms(v),
        Err(resp) => return resp,
    };

    match records::count_by_issue_type(conn, &uucms_no) {
        Ok(counts) => ok(&req.id, json!({ "uucmsNo": uucms_no, "counts": counts })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.issueTypes" => Some(handle_issue_types(state, req)),
        "records.save" => Some(handle_records_save(state, req)),
        "records.list" => Some(handle_records_list(state, req)),
        "records.countByIssueType" => Some(handle_count_by_issue_type(state, req)),
        _ => None,
    }
}
