pub mod engine;
pub mod navigator;
pub mod path;
pub mod progress;
pub mod schema;
pub mod state;
pub mod value;

pub use engine::{FormEngine, FormSnapshot};
pub use navigator::SectionNavigator;
pub use path::{FieldPath, PathError};
pub use progress::{ProgressReport, SectionProgress, calculate_progress, is_present};
pub use schema::{FieldDef, FieldSchema, SchemaError, Section, SectionDef};
pub use state::{FormState, FormStateError};
pub use value::{FieldKind, FieldMap, FormValue};
