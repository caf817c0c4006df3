use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::path::FieldPath;
use super::value::{FieldMap, FormValue};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormStateError {
    #[error("field `{0}` does not exist in this form")]
    UnknownPath(FieldPath),

    #[error("`{0}` is not a group, cannot descend into it")]
    NotAGroup(FieldPath),

    #[error("saved responses must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Nested record holding the current value of every field in a form.
///
/// The shape is fixed by the questionnaire template; `set_field` only
/// replaces values that already exist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    root: FieldMap,
}

impl FormState {
    #[must_use]
    pub fn new(root: FieldMap) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &FieldMap {
        &self.root
    }

    /// Resolves a path. Any missing segment, or a segment that walks into a
    /// non-group value, resolves to `None`.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FormValue> {
        let mut segments = path.segments();
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_group()?.get(segment)?;
        }
        Some(current)
    }

    /// Replaces the value at `path`, leaving every sibling untouched.
    ///
    /// # Errors
    ///
    /// Returns `FormStateError::UnknownPath` if the path does not exist in the
    /// current shape, or `FormStateError::NotAGroup` if an ancestor is a leaf.
    pub fn set_field(&mut self, path: &FieldPath, value: FormValue) -> Result<(), FormStateError> {
        let slot = self.slot_mut(path)?;
        *slot = value;
        Ok(())
    }

    fn slot_mut(&mut self, path: &FieldPath) -> Result<&mut FormValue, FormStateError> {
        let segments: Vec<&str> = path.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(FormStateError::UnknownPath(path.clone()));
        };

        let mut map = &mut self.root;
        for segment in parents {
            match map.get_mut(*segment) {
                Some(FormValue::Group(children)) => map = children,
                Some(_) => return Err(FormStateError::NotAGroup(path.clone())),
                None => return Err(FormStateError::UnknownPath(path.clone())),
            }
        }
        map.get_mut(*last)
            .ok_or_else(|| FormStateError::UnknownPath(path.clone()))
    }

    /// Inserts a value at `path`, creating intermediate groups as needed.
    /// Used while building templates, where the shape does not exist yet.
    pub(crate) fn insert(&mut self, path: &FieldPath, value: FormValue) -> Result<(), FormStateError> {
        let segments: Vec<&str> = path.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(FormStateError::UnknownPath(path.clone()));
        };

        let mut map = &mut self.root;
        for segment in parents {
            let entry = map
                .entry((*segment).to_owned())
                .or_insert_with(|| FormValue::Group(FieldMap::new()));
            match entry {
                FormValue::Group(children) => map = children,
                _ => return Err(FormStateError::NotAGroup(path.clone())),
            }
        }
        map.insert((*last).to_owned(), value);
        Ok(())
    }

    /// Overlays persisted values onto this state.
    ///
    /// Groups merge key by key and leaves replace leaves. A persisted value
    /// whose shape disagrees with the template (a leaf where a group is
    /// expected, or the reverse) is dropped so the template shape survives.
    /// Keys the template does not know are kept.
    pub fn merge_from(&mut self, persisted: FieldMap) {
        merge_maps(&mut self.root, persisted, "");
    }

    /// Parses a persisted `responses` document.
    ///
    /// Leaves of an unsupported type (numbers, arrays holding anything but
    /// strings) are logged and skipped; the rest of the document is kept.
    ///
    /// # Errors
    ///
    /// Returns `FormStateError::Json` for malformed JSON and
    /// `FormStateError::NotAnObject` when the top level is not an object.
    pub fn parse_fields(json: &str) -> Result<FieldMap, FormStateError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(object) => Ok(fields_from_json(object, "")),
            _ => Err(FormStateError::NotAnObject),
        }
    }

    /// # Errors
    ///
    /// See [`FormState::parse_fields`].
    pub fn from_json(json: &str) -> Result<Self, FormStateError> {
        Self::parse_fields(json).map(Self::new)
    }

    /// # Errors
    ///
    /// Returns `FormStateError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, FormStateError> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// True once any leaf holds a non-empty string or a `true` flag.
    #[must_use]
    pub fn has_any_content(&self) -> bool {
        self.root.values().any(FormValue::has_content)
    }

    /// Every non-group node, in key order.
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        collect_leaves(&self.root, "", &mut out);
        out
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn fields_from_json(object: serde_json::Map<String, Value>, prefix: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    for (key, value) in object {
        let path = join(prefix, &key);
        match value_from_json(value, &path) {
            Some(value) => {
                fields.insert(key, value);
            }
            None => warn!(path = %path, "ignoring saved value of unsupported type"),
        }
    }
    fields
}

fn value_from_json(value: Value, path: &str) -> Option<FormValue> {
    match value {
        Value::Null => Some(FormValue::Empty),
        Value::Bool(flag) => Some(FormValue::Flag(flag)),
        Value::String(text) => Some(FormValue::Text(text)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(FormValue::List),
        Value::Object(object) => Some(FormValue::Group(fields_from_json(object, path))),
        Value::Number(_) => None,
    }
}

fn merge_maps(target: &mut FieldMap, incoming: FieldMap, prefix: &str) {
    for (key, value) in incoming {
        match (target.get_mut(&key), value) {
            (Some(FormValue::Group(existing)), FormValue::Group(children)) => {
                let path = join(prefix, &key);
                merge_maps(existing, children, &path);
            }
            (Some(existing), value) if existing.is_group() != value.is_group() => {
                warn!(
                    path = %join(prefix, &key),
                    "saved value does not match the form layout, keeping the template"
                );
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn collect_leaves(map: &FieldMap, prefix: &str, out: &mut Vec<FieldPath>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            FormValue::Group(children) => collect_leaves(children, &path, out),
            _ => {
                // Keys containing dots cannot be addressed; skip them.
                if let Ok(path) = FieldPath::parse(path) {
                    out.push(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    fn sample() -> FormState {
        let mut state = FormState::default();
        state.insert(&path("a.b.c"), FormValue::from("")).unwrap();
        state.insert(&path("a.b.d"), FormValue::from("keep")).unwrap();
        state.insert(&path("a.e"), FormValue::Flag(true)).unwrap();
        state.insert(&path("top"), FormValue::from("")).unwrap();
        state
    }

    #[test]
    fn set_field_preserves_siblings() {
        let mut state = sample();
        let before = state.clone();
        state.set_field(&path("a.b.c"), FormValue::from("x")).unwrap();

        assert_eq!(state.get(&path("a.b.c")), Some(&FormValue::from("x")));
        for sibling in ["a.b.d", "a.e", "top"] {
            assert_eq!(state.get(&path(sibling)), before.get(&path(sibling)));
        }
    }

    #[test]
    fn set_field_rejects_unknown_paths() {
        let mut state = sample();
        assert!(matches!(
            state.set_field(&path("a.b.zzz"), FormValue::Flag(true)),
            Err(FormStateError::UnknownPath(_))
        ));
        assert!(matches!(
            state.set_field(&path("nope.x"), FormValue::Flag(true)),
            Err(FormStateError::UnknownPath(_))
        ));
        assert!(matches!(
            state.set_field(&path("top.x"), FormValue::Flag(true)),
            Err(FormStateError::NotAGroup(_))
        ));
        assert_eq!(state, sample());
    }

    #[test]
    fn get_walks_only_through_groups() {
        let state = sample();
        assert!(state.get(&path("top.x")).is_none());
        assert!(state.get(&path("a.missing")).is_none());
        assert!(state.get(&path("a.b")).unwrap().is_group());
    }

    #[test]
    fn merge_overlays_nested_values_and_keeps_defaults() {
        let mut state = sample();
        let persisted = FormState::parse_fields(r#"{"a":{"b":{"c":"saved"}},"extra":"kept"}"#)
            .unwrap();
        state.merge_from(persisted);

        assert_eq!(state.get(&path("a.b.c")), Some(&FormValue::from("saved")));
        assert_eq!(state.get(&path("a.b.d")), Some(&FormValue::from("keep")));
        assert_eq!(state.get(&path("extra")), Some(&FormValue::from("kept")));
    }

    #[test]
    fn merge_keeps_template_shape_on_mismatch() {
        let mut state = sample();
        let persisted =
            FormState::parse_fields(r#"{"a":{"b":"flat","e":true},"top":{"x":"nested"}}"#).unwrap();
        state.merge_from(persisted);

        assert!(state.get(&path("a.b")).unwrap().is_group());
        assert_eq!(state.get(&path("a.b.d")), Some(&FormValue::from("keep")));
        assert_eq!(state.get(&path("a.e")), Some(&FormValue::Flag(true)));
        assert_eq!(state.get(&path("top")), Some(&FormValue::from("")));
        assert!(state.set_field(&path("a.b.c"), FormValue::from("x")).is_ok());
    }

    #[test]
    fn unsupported_leaves_are_skipped_not_fatal() {
        let fields =
            FormState::parse_fields(r#"{"a":{"n":3,"list":["x",1],"ok":"yes"},"tags":["p","q"]}"#)
                .unwrap();
        let state = FormState::new(fields);

        assert!(state.get(&path("a.n")).is_none());
        assert!(state.get(&path("a.list")).is_none());
        assert_eq!(state.get(&path("a.ok")), Some(&FormValue::from("yes")));
        assert_eq!(
            state.get(&path("tags")),
            Some(&FormValue::List(vec!["p".into(), "q".into()]))
        );
    }

    #[test]
    fn json_round_trip_preserves_presence() {
        let mut state = sample();
        state.set_field(&path("top"), FormValue::from("hi")).unwrap();
        let json = state.to_json().unwrap();
        let restored = FormState::from_json(&json).unwrap();

        for leaf in state.leaf_paths() {
            let before = state.get(&leaf).is_some_and(FormValue::is_present);
            let after = restored.get(&leaf).is_some_and(FormValue::is_present);
            assert_eq!(before, after, "presence changed for {leaf}");
        }
        assert_eq!(restored, state);
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            FormState::from_json("[1, 2]"),
            Err(FormStateError::Json(_) | FormStateError::NotAnObject)
        ));
        assert!(matches!(
            FormState::from_json("\"text\""),
            Err(FormStateError::NotAnObject)
        ));
        assert!(matches!(
            FormState::from_json("{not json"),
            Err(FormStateError::Json(_))
        ));
    }

    #[test]
    fn content_detection() {
        let mut state = FormState::default();
        state.insert(&path("a.b"), FormValue::from("")).unwrap();
        state.insert(&path("a.c"), FormValue::Flag(false)).unwrap();
        assert!(!state.has_any_content());

        state.set_field(&path("a.c"), FormValue::Flag(true)).unwrap();
        assert!(state.has_any_content());
    }

    #[test]
    fn leaf_paths_are_sorted_and_complete() {
        let leaves: Vec<String> = sample()
            .leaf_paths()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(leaves, vec!["a.b.c", "a.b.d", "a.e", "top"]);
    }
}
