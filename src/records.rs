//! Append-only discipline record log.
//!
//! Rows are only ever inserted. Lookups by UUCMS number are exact and
//! case-sensitive; callers normalize the number before asking.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params_from_iter, Connection};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const ISSUE_TYPES: [&str; 7] = [
    "Uniform Violation",
    "Late to Class",
    "Mobile Usage",
    "Misbehavior",
    "Low Attendance",
    "ID Card Missing",
    "Other",
];

pub const OTHER_ISSUE: &str = "Other";

pub fn is_known_issue_type(issue_type: &str) -> bool {
    ISSUE_TYPES.iter().any(|t| *t == issue_type)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineRecord {
    pub id: String,
    pub uucms_no: String,
    pub issue_type: String,
    pub reason: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub reported_by: String,
}

fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn serialize_timestamp<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(t))
}

/// Appends one record stamped with the current time. Neither the UUCMS number
/// nor the issue type is checked.
pub fn save_record(
    conn: &Connection,
    uucms_no: &str,
    issue_type: &str,
    reason: &str,
    reported_by: &str,
) -> StoreResult<DisciplineRecord> {
    let record = DisciplineRecord {
        id: Uuid::new_v4().to_string(),
        uucms_no: uucms_no.to_string(),
        issue_type: issue_type.to_string(),
        reason: reason.to_string(),
        created_at: Utc::now(),
        reported_by: reported_by.to_string(),
    };
    conn.execute(
        "INSERT INTO discipline_records(id, uucms_no, issue_type, reason, created_at, reported_by)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &record.id,
            &record.uucms_no,
            &record.issue_type,
            &record.reason,
            format_timestamp(&record.created_at),
            &record.reported_by,
        ),
    )?;
    tracing::info!(
        record_id = %record.id,
        uucms_no = %record.uucms_no,
        issue_type = %record.issue_type,
        known_issue_type = is_known_issue_type(&record.issue_type),
        "discipline record saved"
    );
    Ok(record)
}

/// Every record, or only those for `uucms_no`, in insertion order.
pub fn get_records(conn: &Connection, uucms_no: Option<&str>) -> StoreResult<Vec<DisciplineRecord>> {
    let mut sql = String::from(
        "SELECT id, uucms_no, issue_type, reason, created_at, reported_by
         FROM discipline_records",
    );
    let mut bind: Vec<&str> = Vec::new();
    if let Some(u) = uucms_no {
        sql.push_str(" WHERE uucms_no = ?");
        bind.push(u);
    }
    sql.push_str(" ORDER BY seq");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(bind), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(decode_record).collect()
}

type RawRecord = (String, String, String, String, String, String);

fn decode_record(raw: RawRecord) -> StoreResult<DisciplineRecord> {
    let (id, uucms_no, issue_type, reason, created_at, reported_by) = raw;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::corrupt(format!("record {id} created_at {created_at:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(DisciplineRecord {
        id,
        uucms_no,
        issue_type,
        reason,
        created_at,
        reported_by,
    })
}

/// Occurrences per issue type for one student. Types that never occur are
/// left out rather than reported as zero.
pub fn count_by_issue_type(conn: &Connection, uucms_no: &str) -> StoreResult<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for r in get_records(conn, Some(uucms_no))? {
        *counts.entry(r.issue_type).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Display order for history views: newest first, ties keep insertion order.
pub fn most_recent_first(mut records: Vec<DisciplineRecord>) -> Vec<DisciplineRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}
