use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AssignmentId, DocumentId, MemberId, ResponseId};

/// A response record as the backend stores it.
///
/// `responses` and `section_progress` are JSON documents carried as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResponse {
    pub id: ResponseId,
    pub assignment_id: AssignmentId,
    pub responses: String,
    pub progress: u8,
    pub section_progress: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl SavedResponse {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= 100
    }
}

/// Body of an upsert. Every save is a full overwrite of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponseRequest {
    pub assignment_id: AssignmentId,
    pub member_id: MemberId,
    pub document_id: DocumentId,
    pub responses: String,
    pub progress: u8,
    pub section_progress: String,
    pub auto_save_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn save_request_uses_backend_field_names() {
        let request = SaveResponseRequest {
            assignment_id: AssignmentId::new(1),
            member_id: MemberId::new(2),
            document_id: DocumentId::new(3),
            responses: "{}".into(),
            progress: 40,
            section_progress: "[40]".into(),
            auto_save_enabled: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["assignment_id"], 1);
        assert_eq!(value["member_id"], 2);
        assert_eq!(value["document_id"], 3);
        assert_eq!(value["responses"], "{}");
        assert_eq!(value["section_progress"], "[40]");
        assert_eq!(value["auto_save_enabled"], true);
    }

    #[test]
    fn saved_response_tolerates_missing_optional_timestamps() {
        let json = format!(
            r#"{{"id":5,"assignment_id":1,"responses":"{{}}","progress":100,"section_progress":"[100]","started_at":"{}"}}"#,
            fixed_now().to_rfc3339()
        );
        let saved: SavedResponse = serde_json::from_str(&json).unwrap();
        assert!(saved.completed_at.is_none());
        assert!(saved.last_saved_at.is_none());
        assert!(saved.is_complete());
    }
}
