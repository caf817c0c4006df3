use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Children of a group node, keyed by path segment.
pub type FieldMap = BTreeMap<String, FormValue>;

/// A single node in a form-state tree.
///
/// Serializes as the plain JSON value (`null`, bool, string, array of
/// strings, object) so persisted responses stay ordinary JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    #[default]
    Empty,
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Group(FieldMap),
}

/// Kind of leaf a field holds in a questionnaire template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    List,
}

impl FieldKind {
    /// The untouched value a template starts with.
    #[must_use]
    pub fn default_value(self) -> FormValue {
        match self {
            FieldKind::Text => FormValue::Text(String::new()),
            FieldKind::Flag => FormValue::Flag(false),
            FieldKind::List => FormValue::List(Vec::new()),
        }
    }
}

impl FormValue {
    /// Presence as counted by progress: `true` flags and non-empty text only.
    ///
    /// Lists and groups are never present on their own; checkbox groups are
    /// tracked one flag per option.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            FormValue::Flag(flag) => *flag,
            FormValue::Text(text) => !text.is_empty(),
            FormValue::Empty | FormValue::List(_) | FormValue::Group(_) => false,
        }
    }

    /// True when this node or anything below it differs from an empty default.
    #[must_use]
    pub fn has_content(&self) -> bool {
        match self {
            FormValue::Empty => false,
            FormValue::Flag(flag) => *flag,
            FormValue::Text(text) => !text.is_empty(),
            FormValue::List(items) => items.iter().any(|item| !item.is_empty()),
            FormValue::Group(children) => children.values().any(FormValue::has_content),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FormValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&FieldMap> {
        match self {
            FormValue::Group(children) => Some(children),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, FormValue::Group(_))
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        FormValue::Flag(value)
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_owned())
    }
}

impl From<Vec<String>> for FormValue {
    fn from(value: Vec<String>) -> Self {
        FormValue::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_counts_only_true_and_non_empty_text() {
        assert!(FormValue::Flag(true).is_present());
        assert!(FormValue::from("x").is_present());

        assert!(!FormValue::Flag(false).is_present());
        assert!(!FormValue::from("").is_present());
        assert!(!FormValue::Empty.is_present());
        assert!(!FormValue::List(vec!["a".into()]).is_present());
        assert!(!FormValue::Group(FieldMap::new()).is_present());
    }

    #[test]
    fn content_looks_inside_lists_and_groups() {
        let mut inner = FieldMap::new();
        inner.insert("a".into(), FormValue::List(vec![String::new(), "b".into()]));
        assert!(FormValue::Group(inner).has_content());

        let mut blank = FieldMap::new();
        blank.insert("a".into(), FormValue::Flag(false));
        blank.insert("b".into(), FormValue::List(vec![String::new()]));
        assert!(!FormValue::Group(blank).has_content());
    }

    #[test]
    fn json_shape_is_plain() {
        let mut map = FieldMap::new();
        map.insert("done".into(), FormValue::Flag(true));
        map.insert("name".into(), FormValue::from("Ada"));
        map.insert("missing".into(), FormValue::Empty);
        map.insert("tags".into(), FormValue::List(vec!["x".into()]));
        let json = serde_json::to_string(&FormValue::Group(map.clone())).unwrap();
        assert_eq!(
            json,
            r#"{"done":true,"missing":null,"name":"Ada","tags":["x"]}"#
        );

        let back: FormValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FormValue::Group(map));
    }

    #[test]
    fn field_kind_defaults_are_absent() {
        for kind in [FieldKind::Text, FieldKind::Flag, FieldKind::List] {
            let value = kind.default_value();
            assert!(!value.is_present());
            assert!(!value.has_content());
        }
    }
}
