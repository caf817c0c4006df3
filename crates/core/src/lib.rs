#![forbid(unsafe_code)]

pub mod error;
pub mod form;
pub mod model;
pub mod questionnaire;
pub mod time;

pub use error::Error;
pub use questionnaire::{Questionnaire, QuestionnaireKind};
pub use time::Clock;
