use async_trait::async_trait;
use careplan_core::model::{AssignmentId, SavedResponse};

use super::SqliteRepository;
use super::mapping::{map_response_row, u64_to_i64};
use crate::repository::{ResponseRepository, StorageError, UpsertResponseRecord};

const SELECT_COLUMNS: &str = r"
    SELECT id, assignment_id, responses, progress, section_progress,
           started_at, completed_at, last_saved_at
    FROM responses
";

#[async_trait]
impl ResponseRepository for SqliteRepository {
    async fn get_response(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<SavedResponse>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE assignment_id = ?1");
        let row = sqlx::query(&sql)
            .bind(u64_to_i64("assignment_id", assignment_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_response_row).transpose()
    }

    async fn upsert_response(
        &self,
        record: UpsertResponseRecord,
    ) -> Result<SavedResponse, StorageError> {
        let assignment_id = u64_to_i64("assignment_id", record.assignment_id.value())?;
        let completed_at = record.completed_at();

        sqlx::query(
            r"
            INSERT INTO responses (
                assignment_id,
                document_id,
                member_id,
                responses,
                progress,
                section_progress,
                started_at,
                completed_at,
                last_saved_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?7)
            ON CONFLICT(assignment_id) DO UPDATE SET
                document_id = excluded.document_id,
                member_id = excluded.member_id,
                responses = excluded.responses,
                progress = excluded.progress,
                section_progress = excluded.section_progress,
                completed_at = COALESCE(responses.completed_at, excluded.completed_at),
                last_saved_at = excluded.last_saved_at
            ",
        )
        .bind(assignment_id)
        .bind(u64_to_i64("document_id", record.document_id.value())?)
        .bind(u64_to_i64("member_id", record.member_id.value())?)
        .bind(record.responses)
        .bind(i64::from(record.progress))
        .bind(record.section_progress)
        .bind(record.saved_at)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.get_response(record.assignment_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn list_responses(&self, limit: u32) -> Result<Vec<SavedResponse>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY last_saved_at DESC, id DESC LIMIT ?1");
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_response_row).collect()
    }
}
