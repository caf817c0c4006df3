use serde::{Deserialize, Serialize};

use super::ids::{AssignmentId, DocumentId};
use super::response::SavedResponse;
use crate::questionnaire::QuestionnaireKind;

/// Which document a form instance belongs to, and any response already saved
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub document_id: DocumentId,
    pub kind: QuestionnaireKind,
    #[serde(default)]
    pub initial_data: Option<SavedResponse>,
}

impl Assignment {
    #[must_use]
    pub fn new(id: AssignmentId, document_id: DocumentId, kind: QuestionnaireKind) -> Self {
        Self {
            id,
            document_id,
            kind,
            initial_data: None,
        }
    }

    #[must_use]
    pub fn with_initial_data(mut self, saved: SavedResponse) -> Self {
        self.initial_data = Some(saved);
        self
    }
}
