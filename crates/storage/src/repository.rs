use async_trait::async_trait;
use careplan_core::model::{
    AssignmentId, DocumentId, MemberId, ResponseId, SaveResponseRequest, SavedResponse,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Write-side shape of a response save.
///
/// Carries the owning document and member alongside the form payload; the
/// read side (`SavedResponse`) only exposes what the form needs back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertResponseRecord {
    pub assignment_id: AssignmentId,
    pub document_id: DocumentId,
    pub member_id: MemberId,
    pub responses: String,
    pub progress: u8,
    pub section_progress: String,
    pub saved_at: DateTime<Utc>,
}

impl UpsertResponseRecord {
    #[must_use]
    pub fn from_request(request: &SaveResponseRequest, saved_at: DateTime<Utc>) -> Self {
        Self {
            assignment_id: request.assignment_id,
            document_id: request.document_id,
            member_id: request.member_id,
            responses: request.responses.clone(),
            progress: request.progress.min(100),
            section_progress: request.section_progress.clone(),
            saved_at,
        }
    }

    /// Completion timestamp this save would set, if it is the first to reach 100%.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        (self.progress >= 100).then_some(self.saved_at)
    }
}

/// Repository contract for saved questionnaire responses.
///
/// One response exists per assignment. `started_at` is fixed by the first
/// save, `last_saved_at` moves on every save, and `completed_at` is set by the
/// first save that reaches 100% and never cleared afterwards.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Fetch the response saved for an assignment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_response(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<SavedResponse>, StorageError>;

    /// Insert or overwrite the response for `record.assignment_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_response(
        &self,
        record: UpsertResponseRecord,
    ) -> Result<SavedResponse, StorageError>;

    /// Most recently saved responses first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_responses(&self, limit: u32) -> Result<Vec<SavedResponse>, StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    next_id: u64,
    responses: HashMap<AssignmentId, SavedResponse>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseRepository for InMemoryRepository {
    async fn get_response(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<SavedResponse>, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.responses.get(&assignment_id).cloned())
    }

    async fn upsert_response(
        &self,
        record: UpsertResponseRecord,
    ) -> Result<SavedResponse, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let completed_at = record.completed_at();

        let existing = guard
            .responses
            .get(&record.assignment_id)
            .map(|found| (found.id, found.started_at, found.completed_at));

        let (id, started_at, completed_at) = match existing {
            Some((id, started_at, previous)) => (id, started_at, previous.or(completed_at)),
            None => {
                guard.next_id += 1;
                (ResponseId::new(guard.next_id), record.saved_at, completed_at)
            }
        };

        let saved = SavedResponse {
            id,
            assignment_id: record.assignment_id,
            responses: record.responses,
            progress: record.progress,
            section_progress: record.section_progress,
            started_at,
            completed_at,
            last_saved_at: Some(record.saved_at),
        };

        guard.responses.insert(saved.assignment_id, saved.clone());
        Ok(saved)
    }

    async fn list_responses(&self, limit: u32) -> Result<Vec<SavedResponse>, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut all: Vec<SavedResponse> = guard.responses.values().cloned().collect();
        all.sort_by(|a, b| {
            b.last_saved_at
                .cmp(&a.last_saved_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        all.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(all)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub responses: Arc<dyn ResponseRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let responses: Arc<dyn ResponseRepository> = Arc::new(InMemoryRepository::new());
        Self { responses }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careplan_core::time::fixed_now;
    use chrono::Duration;

    fn record(assignment: u64, progress: u8, saved_at: DateTime<Utc>) -> UpsertResponseRecord {
        UpsertResponseRecord {
            assignment_id: AssignmentId::new(assignment),
            document_id: DocumentId::new(10),
            member_id: MemberId::new(20),
            responses: format!(r#"{{"progress":"{progress}"}}"#),
            progress,
            section_progress: format!("[{progress}]"),
            saved_at,
        }
    }

    #[tokio::test]
    async fn first_save_starts_the_response() {
        let repo = InMemoryRepository::new();
        let saved = repo.upsert_response(record(1, 20, fixed_now())).await.unwrap();

        assert_eq!(saved.id, ResponseId::new(1));
        assert_eq!(saved.started_at, fixed_now());
        assert_eq!(saved.last_saved_at, Some(fixed_now()));
        assert!(saved.completed_at.is_none());

        let fetched = repo.get_response(AssignmentId::new(1)).await.unwrap();
        assert_eq!(fetched, Some(saved));
    }

    #[tokio::test]
    async fn later_saves_overwrite_but_keep_start_and_completion() {
        let repo = InMemoryRepository::new();
        let t0 = fixed_now();
        let t1 = t0 + Duration::minutes(5);
        let t2 = t0 + Duration::minutes(10);

        repo.upsert_response(record(1, 50, t0)).await.unwrap();
        let done = repo.upsert_response(record(1, 100, t1)).await.unwrap();
        assert_eq!(done.completed_at, Some(t1));

        let reopened = repo.upsert_response(record(1, 90, t2)).await.unwrap();
        assert_eq!(reopened.id, done.id);
        assert_eq!(reopened.started_at, t0);
        assert_eq!(reopened.completed_at, Some(t1));
        assert_eq!(reopened.last_saved_at, Some(t2));
        assert_eq!(reopened.progress, 90);
        assert_eq!(reopened.section_progress, "[90]");
    }

    #[tokio::test]
    async fn list_orders_by_last_save() {
        let repo = InMemoryRepository::new();
        let t0 = fixed_now();
        repo.upsert_response(record(1, 10, t0)).await.unwrap();
        repo.upsert_response(record(2, 10, t0 + Duration::minutes(1)))
            .await
            .unwrap();
        repo.upsert_response(record(3, 10, t0 + Duration::minutes(2)))
            .await
            .unwrap();

        let listed = repo.list_responses(2).await.unwrap();
        let ids: Vec<u64> = listed.iter().map(|r| r.assignment_id.value()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn missing_assignment_is_none() {
        let storage = Storage::in_memory();
        let fetched = storage
            .responses
            .get_response(AssignmentId::new(99))
            .await
            .unwrap();
        assert!(fetched.is_none());
    }
}
