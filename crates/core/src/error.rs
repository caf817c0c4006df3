use thiserror::Error;

use crate::form::{FormStateError, PathError, SchemaError};
use crate::model::ParseIdError;
use crate::questionnaire::UnknownQuestionnaire;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    State(#[from] FormStateError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
    #[error(transparent)]
    Questionnaire(#[from] UnknownQuestionnaire),
}
