use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::roster::{filter_students, Course, Year};
use serde_json::json;

fn handle_courses_list(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let courses: Vec<serde_json::Value> = Course::ALL
        .into_iter()
        .map(|c| {
            json!({
                "code": c.code(),
                "name": c.display_name(),
                "capacity": c.capacity(),
                "studentsPerYear": c.roster_size(),
            })
        })
        .collect();
    let years: Vec<&str> = Year::ALL.into_iter().map(Year::label).collect();
    ok(&req.id, json!({ "courses": courses, "years": years }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let course = match required_str(req, "course") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let year = match required_str(req, "year") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(year) = Year::parse(year) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown year: {year}"),
            Some(json!({ "allowed": Year::ALL.map(Year::label) })),
        );
    };
    // An unknown course has no seats, so its roster is empty.
    let Some(course) = Course::parse(course) else {
        return ok(&req.id, json!({ "students": [] }));
    };

    let students = state.directory.list_students(course, year);
    let students = match str_param(req, "query") {
        Some(q) => filter_students(students, q),
        None => students,
    };
    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        _ => None,
    }
}
