use careplan_core::model::{AssignmentId, ResponseId, SavedResponse};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_response_row(row: &sqlx::sqlite::SqliteRow) -> Result<SavedResponse, StorageError> {
    let id = ResponseId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let assignment_id = AssignmentId::new(i64_to_u64(
        "assignment_id",
        row.try_get("assignment_id").map_err(ser)?,
    )?);

    let progress_i64: i64 = row.try_get("progress").map_err(ser)?;
    let progress = u8::try_from(progress_i64)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| StorageError::Serialization(format!("invalid progress: {progress_i64}")))?;

    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;
    let last_saved_at: Option<DateTime<Utc>> = row.try_get("last_saved_at").map_err(ser)?;

    Ok(SavedResponse {
        id,
        assignment_id,
        responses: row.try_get("responses").map_err(ser)?,
        progress,
        section_progress: row.try_get("section_progress").map_err(ser)?,
        started_at,
        completed_at,
        last_saved_at,
    })
}
