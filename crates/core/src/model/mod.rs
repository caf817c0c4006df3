mod assignment;
mod ids;
mod response;

pub use assignment::Assignment;
pub use ids::{AssignmentId, DocumentId, MemberId, ParseIdError, ResponseId};
pub use response::{SaveResponseRequest, SavedResponse};
