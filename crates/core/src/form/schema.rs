use std::collections::HashSet;

use thiserror::Error;

use super::path::{FieldPath, PathError};
use super::state::{FormState, FormStateError};
use super::value::FieldKind;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("a form needs at least one section")]
    NoSections,

    #[error("section id {0} is used more than once")]
    DuplicateSectionId(u32),

    #[error("field `{0}` is tracked by more than one section")]
    DuplicatePath(FieldPath),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Template(#[from] FormStateError),
}

//
// ─── STATIC DEFINITIONS ────────────────────────────────────────────────────────
//

/// A field as written in a questionnaire definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub path: &'static str,
    pub kind: FieldKind,
}

#[must_use]
pub const fn text(path: &'static str) -> FieldDef {
    FieldDef {
        path,
        kind: FieldKind::Text,
    }
}

#[must_use]
pub const fn flag(path: &'static str) -> FieldDef {
    FieldDef {
        path,
        kind: FieldKind::Flag,
    }
}

#[must_use]
pub const fn list(path: &'static str) -> FieldDef {
    FieldDef {
        path,
        kind: FieldKind::List,
    }
}

/// A section as written in a questionnaire definition.
#[derive(Debug, Clone, Copy)]
pub struct SectionDef {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub fields: &'static [FieldDef],
}

//
// ─── SCHEMA ────────────────────────────────────────────────────────────────────
//

/// One page of a questionnaire and the fields whose completion it tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: u32,
    title: String,
    description: String,
    icon: Option<String>,
    field_paths: Vec<FieldPath>,
}

impl Section {
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            icon: None,
            field_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Appends tracked fields in order.
    ///
    /// # Errors
    ///
    /// Returns `PathError` if any path is malformed.
    pub fn with_fields<I, S>(mut self, paths: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.field_paths.push(FieldPath::parse(path)?);
        }
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    #[must_use]
    pub fn field_paths(&self) -> &[FieldPath] {
        &self.field_paths
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_paths.len()
    }
}

/// Ordered list of sections. A field path belongs to at most one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    sections: Vec<Section>,
}

impl FieldSchema {
    /// # Errors
    ///
    /// Returns `SchemaError` if there are no sections, a section id repeats,
    /// or a field path is tracked twice.
    pub fn new(sections: Vec<Section>) -> Result<Self, SchemaError> {
        if sections.is_empty() {
            return Err(SchemaError::NoSections);
        }

        let mut ids = HashSet::new();
        let mut paths = HashSet::new();
        for section in &sections {
            if !ids.insert(section.id) {
                return Err(SchemaError::DuplicateSectionId(section.id));
            }
            for path in &section.field_paths {
                if !paths.insert(path) {
                    return Err(SchemaError::DuplicatePath(path.clone()));
                }
            }
        }

        Ok(Self { sections })
    }

    /// Builds a schema from static section definitions.
    ///
    /// # Errors
    ///
    /// See [`FieldSchema::new`]; malformed paths surface as `SchemaError::Path`.
    pub fn from_defs(defs: &[SectionDef]) -> Result<Self, SchemaError> {
        let sections = defs
            .iter()
            .map(|def| {
                Section::new(def.id, def.title, def.description)
                    .with_icon(def.icon)
                    .with_fields(def.fields.iter().map(|field| field.path))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sections)
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    pub fn field_counts(&self) -> Vec<usize> {
        self.sections.iter().map(Section::field_count).collect()
    }

    #[must_use]
    pub fn total_fields(&self) -> usize {
        self.sections.iter().map(Section::field_count).sum()
    }

    /// Tracked paths that do not resolve in `state`.
    #[must_use]
    pub fn check_against(&self, state: &FormState) -> Vec<&FieldPath> {
        self.sections
            .iter()
            .flat_map(|section| section.field_paths.iter())
            .filter(|path| state.get(path).is_none())
            .collect()
    }
}

/// Builds the all-empty state for a questionnaire: every tracked field from
/// `sections` plus the `untracked` ones.
///
/// # Errors
///
/// Returns `SchemaError` if a path is malformed or two definitions disagree
/// on whether a node is a group.
pub fn template_from_defs(
    sections: &[SectionDef],
    untracked: &[FieldDef],
) -> Result<FormState, SchemaError> {
    let mut state = FormState::default();
    let fields = sections
        .iter()
        .flat_map(|section| section.fields.iter())
        .chain(untracked.iter());
    for field in fields {
        let path = FieldPath::parse(field.path)?;
        state.insert(&path, field.kind.default_value())?;
    }
    Ok(state)
}
