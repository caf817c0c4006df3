use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    #[error("field path cannot be empty")]
    Empty,

    #[error("field path `{0}` contains an empty segment")]
    EmptySegment(String),
}

/// Dot-separated path into a form-state tree, e.g. `care.stage_mild.comfort`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    /// Validates and wraps a raw path.
    ///
    /// # Errors
    ///
    /// Returns `PathError` if the path is empty or has an empty segment
    /// (leading, trailing or doubled dots).
    pub fn parse(raw: impl Into<String>) -> Result<Self, PathError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if raw.split('.').any(str::is_empty) {
            return Err(PathError::EmptySegment(raw));
        }
        Ok(Self(raw))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The final segment (the leaf's key inside its parent group).
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a child segment.
    ///
    /// # Errors
    ///
    /// Returns `PathError::EmptySegment` if `segment` is empty or itself
    /// contains an empty segment.
    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        Self::parse(format!("{}.{segment}", self.0))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.0
    }
}
