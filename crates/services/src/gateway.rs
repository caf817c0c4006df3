use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use careplan_core::Clock;
use careplan_core::model::{AssignmentId, SaveResponseRequest, SavedResponse};
use storage::repository::{ResponseRepository, UpsertResponseRecord};

use crate::error::GatewayError;

/// Where form sessions load and save their responses.
#[async_trait]
pub trait ResponseGateway: Send + Sync {
    /// Fetch the saved response for an assignment, if any.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` when the backend cannot be reached or answers
    /// with an unexpected status.
    async fn load(&self, assignment_id: AssignmentId)
    -> Result<Option<SavedResponse>, GatewayError>;

    /// Upsert the full response for `request.assignment_id`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` when the save is rejected or fails in transit.
    async fn save(&self, request: &SaveResponseRequest) -> Result<SavedResponse, GatewayError>;
}

/// Renders a completed assignment as a PDF document.
#[async_trait]
pub trait DocumentExporter: Send + Sync {
    /// # Errors
    ///
    /// Returns `GatewayError` when the document cannot be produced.
    async fn export_pdf(&self, assignment_id: AssignmentId) -> Result<Vec<u8>, GatewayError>;
}

/// Gateway backed directly by a response repository.
#[derive(Clone)]
pub struct RepositoryGateway {
    clock: Clock,
    responses: Arc<dyn ResponseRepository>,
}

impl RepositoryGateway {
    #[must_use]
    pub fn new(clock: Clock, responses: Arc<dyn ResponseRepository>) -> Self {
        Self { clock, responses }
    }
}

#[async_trait]
impl ResponseGateway for RepositoryGateway {
    async fn load(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<SavedResponse>, GatewayError> {
        Ok(self.responses.get_response(assignment_id).await?)
    }

    async fn save(&self, request: &SaveResponseRequest) -> Result<SavedResponse, GatewayError> {
        let record = UpsertResponseRecord::from_request(request, self.clock.now());
        let saved = self.responses.upsert_response(record).await?;
        info!(
            assignment_id = %saved.assignment_id,
            progress = saved.progress,
            auto_save = request.auto_save_enabled,
            "response stored"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careplan_core::model::{DocumentId, MemberId};
    use careplan_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn request(progress: u8) -> SaveResponseRequest {
        SaveResponseRequest {
            assignment_id: AssignmentId::new(8),
            member_id: MemberId::new(2),
            document_id: DocumentId::new(3),
            responses: r#"{"a":"b"}"#.to_string(),
            progress,
            section_progress: "[100]".to_string(),
            auto_save_enabled: true,
        }
    }

    #[tokio::test]
    async fn save_then_load_uses_clock() {
        let gateway = RepositoryGateway::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        assert!(gateway.load(AssignmentId::new(8)).await.unwrap().is_none());

        let saved = gateway.save(&request(100)).await.unwrap();
        assert_eq!(saved.last_saved_at, Some(fixed_now()));
        assert_eq!(saved.completed_at, Some(fixed_now()));

        let loaded = gateway.load(AssignmentId::new(8)).await.unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[tokio::test]
    async fn progress_above_hundred_is_clamped() {
        let gateway = RepositoryGateway::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let saved = gateway.save(&request(140)).await.unwrap();
        assert_eq!(saved.progress, 100);
    }
}
