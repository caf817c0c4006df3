//! Questionnaire definitions: a field schema plus the all-empty template the
//! form engine starts from.

mod dementia;
mod firefly;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::form::schema::{FieldDef, FieldSchema, SchemaError, SectionDef, template_from_defs};
use crate::form::state::FormState;

/// The questionnaire types an assignment can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireKind {
    DementiaValues,
    Firefly,
}

impl QuestionnaireKind {
    pub const ALL: [QuestionnaireKind; 2] = [Self::DementiaValues, Self::Firefly];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::DementiaValues => "dementia_values",
            Self::Firefly => "firefly",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::DementiaValues => "Dementia Values & Priorities Tool",
            Self::Firefly => "Firefly Documents",
        }
    }

    /// Builds the questionnaire for this kind.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the built-in definition is inconsistent.
    pub fn questionnaire(self) -> Result<Questionnaire, SchemaError> {
        let (sections, untracked) = match self {
            Self::DementiaValues => (dementia::SECTIONS, dementia::UNTRACKED),
            Self::Firefly => (firefly::SECTIONS, firefly::UNTRACKED),
        };
        Questionnaire::from_defs(self.slug(), self.title(), sections, untracked)
    }
}

impl fmt::Display for QuestionnaireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuestionnaire(pub String);

impl fmt::Display for UnknownQuestionnaire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown questionnaire: {}", self.0)
    }
}

impl std::error::Error for UnknownQuestionnaire {}

impl FromStr for QuestionnaireKind {
    type Err = UnknownQuestionnaire;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "dementia_values" | "dementia" => Ok(Self::DementiaValues),
            "firefly" => Ok(Self::Firefly),
            _ => Err(UnknownQuestionnaire(s.to_string())),
        }
    }
}

/// A schema and its matching template. Shared read-only between forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questionnaire {
    slug: String,
    title: String,
    schema: FieldSchema,
    template: FormState,
}

impl Questionnaire {
    /// Pairs an existing schema and template.
    ///
    /// Tracked paths missing from the template are allowed; they count as
    /// absent. Use [`FieldSchema::check_against`] to find them.
    #[must_use]
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        schema: FieldSchema,
        template: FormState,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            schema,
            template,
        }
    }

    /// # Errors
    ///
    /// Returns `SchemaError` if the section definitions are invalid or the
    /// fields cannot be laid out as a single tree.
    pub fn from_defs(
        slug: impl Into<String>,
        title: impl Into<String>,
        sections: &[SectionDef],
        untracked: &[FieldDef],
    ) -> Result<Self, SchemaError> {
        let schema = FieldSchema::from_defs(sections)?;
        let template = template_from_defs(sections, untracked)?;
        Ok(Self::new(slug, title, schema, template))
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    #[must_use]
    pub fn template(&self) -> &FormState {
        &self.template
    }
}
