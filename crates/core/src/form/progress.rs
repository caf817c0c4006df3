//! Completion percentages derived from a form state and its schema.
//!
//! Overall progress is not an average of section percentages: each
//! section's percentage is converted back into a (rounded) field count, the
//! counts are summed, and the sum is rounded again against the total. Saved
//! `progress` values were produced this way, so the formula is kept as is.

use serde::{Deserialize, Serialize};

use super::schema::FieldSchema;
use super::state::FormState;
use super::value::FormValue;

/// Per-section completion in `[0, 100]`, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionProgress(Vec<u8>);

impl SectionProgress {
    #[must_use]
    pub fn new(values: Vec<u8>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// # Errors
    ///
    /// Returns `serde_json::Error` if `json` is not an array of integers in
    /// `0..=255`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressReport {
    pub sections: SectionProgress,
    pub overall: u8,
}

impl ProgressReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.overall == 100
    }
}

/// Presence of a resolved field. Missing paths are absent.
#[must_use]
pub fn is_present(value: Option<&FormValue>) -> bool {
    value.is_some_and(FormValue::is_present)
}

/// Recomputes every section percentage and the overall percentage.
///
/// Pure: the same state and schema always give the same report. Paths the
/// state cannot resolve count as absent.
#[must_use]
pub fn calculate_progress(schema: &FieldSchema, state: &FormState) -> ProgressReport {
    let mut sections = Vec::with_capacity(schema.len());
    let mut weighted_completed = 0.0_f64;
    let mut total_fields = 0_usize;

    for section in schema.sections() {
        let total = section.field_count();
        let completed = section
            .field_paths()
            .iter()
            .filter(|path| is_present(state.get(path)))
            .count();
        let percent = section_percent(completed, total);
        sections.push(percent);

        weighted_completed += round_half_up(f64::from(percent) / 100.0 * as_f64(total));
        total_fields += total;
    }

    let overall = if total_fields == 0 {
        0
    } else {
        to_percent(round_half_up(100.0 * weighted_completed / as_f64(total_fields)))
    };

    ProgressReport {
        sections: SectionProgress(sections),
        overall,
    }
}

fn section_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = to_percent(round_half_up(100.0 * as_f64(completed) / as_f64(total)));
    // Very large sections could round 99.5 up; only a full section reads 100.
    if completed < total { percent.min(99) } else { percent }
}

/// `Math.round` semantics: halves round toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(count: usize) -> f64 {
    count as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(value: f64) -> u8 {
    value.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::path::FieldPath;
    use crate::form::schema::Section;

    fn schema(sections: &[&[&str]]) -> FieldSchema {
        let sections = sections
            .iter()
            .enumerate()
            .map(|(index, fields)| {
                Section::new(u32::try_from(index).unwrap(), format!("S{index}"), "")
                    .with_fields(fields.iter().copied())
                    .unwrap()
            })
            .collect();
        FieldSchema::new(sections).unwrap()
    }

    fn state(fields: &[(&str, FormValue)]) -> FormState {
        let mut state = FormState::default();
        for (path, value) in fields {
            state
                .insert(&FieldPath::parse(*path).unwrap(), value.clone())
                .unwrap();
        }
        state
    }

    fn set(state: &mut FormState, path: &str, value: impl Into<FormValue>) {
        state
            .set_field(&FieldPath::parse(path).unwrap(), value.into())
            .unwrap();
    }

    #[test]
    fn two_text_fields_walkthrough() {
        let schema = schema(&[&["f1", "f2"]]);
        let mut form = state(&[("f1", "".into()), ("f2", "".into())]);

        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[0]);
        assert_eq!(report.overall, 0);

        set(&mut form, "f1", "x");
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[50]);
        assert_eq!(report.overall, 50);

        set(&mut form, "f2", "y");
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[100]);
        assert_eq!(report.overall, 100);
        assert!(report.is_complete());

        set(&mut form, "f1", "");
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[50]);
        assert_eq!(report.overall, 50);
    }

    #[test]
    fn overall_weights_by_field_count_with_double_rounding() {
        // Section A: 1 of 3 present -> 33%. Section B: 1 of 1 -> 100%.
        // Contributions: round(0.33 * 3) = 1, round(1.0 * 1) = 1 -> 2 / 4 = 50%.
        let schema = schema(&[&["a1", "a2", "a3"], &["b1"]]);
        let form = state(&[
            ("a1", "yes".into()),
            ("a2", "".into()),
            ("a3", FormValue::Flag(false)),
            ("b1", FormValue::Flag(true)),
        ]);
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[33, 100]);
        assert_eq!(report.overall, 50);
    }

    #[test]
    fn overall_recombines_rounded_section_counts() {
        // 2 of 3 -> 67%; round(0.67 * 3) = round(2.01) = 2.
        // 1 of 6 -> 17%; round(0.17 * 6) = round(1.02) = 1.
        // Overall = round(100 * 3 / 9) = 33.
        let schema = schema(&[&["a1", "a2", "a3"], &["b1", "b2", "b3", "b4", "b5", "b6"]]);
        let form = state(&[
            ("a1", "x".into()),
            ("a2", "x".into()),
            ("a3", "".into()),
            ("b1", "x".into()),
            ("b2", "".into()),
            ("b3", "".into()),
            ("b4", "".into()),
            ("b5", "".into()),
            ("b6", "".into()),
        ]);
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[67, 17]);
        assert_eq!(report.overall, 33);
    }

    #[test]
    fn missing_paths_count_as_absent() {
        let schema = schema(&[&["present", "ghost.field"]]);
        let form = state(&[("present", "x".into())]);
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[50]);
    }

    #[test]
    fn empty_sections_report_zero() {
        let schema = schema(&[&[], &["a"]]);
        let form = state(&[("a", FormValue::Flag(true))]);
        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[0, 100]);
        assert_eq!(report.overall, 100);

        let empty = schema_with_no_fields();
        assert_eq!(calculate_progress(&empty, &FormState::default()).overall, 0);
    }

    fn schema_with_no_fields() -> FieldSchema {
        FieldSchema::new(vec![Section::new(1, "Empty", "")]).unwrap()
    }

    #[test]
    fn section_is_full_only_when_every_field_is_present() {
        let paths: Vec<String> = (0..250).map(|i| format!("f{i}")).collect();
        let section = Section::new(1, "Big", "")
            .with_fields(paths.iter().cloned())
            .unwrap();
        let schema = FieldSchema::new(vec![section]).unwrap();
        let mut form = FormState::default();
        for (index, path) in paths.iter().enumerate() {
            let value = if index == 0 { "" } else { "x" };
            form.insert(&FieldPath::parse(path.clone()).unwrap(), value.into())
                .unwrap();
        }

        let report = calculate_progress(&schema, &form);
        assert_eq!(report.sections.as_slice(), &[99]);
        assert!(report.sections.as_slice().iter().all(|p| *p <= 100));
    }

    #[test]
    fn calculation_is_idempotent() {
        let schema = schema(&[&["a", "b"], &["c"]]);
        let form = state(&[("a", "x".into()), ("b", "".into()), ("c", FormValue::Flag(true))]);
        assert_eq!(
            calculate_progress(&schema, &form),
            calculate_progress(&schema, &form)
        );
    }

    #[test]
    fn section_progress_json_is_an_integer_array() {
        let progress = SectionProgress::new(vec![0, 50, 100]);
        let json = progress.to_json().unwrap();
        assert_eq!(json, "[0,50,100]");
        assert_eq!(SectionProgress::from_json(&json).unwrap(), progress);
    }
}
