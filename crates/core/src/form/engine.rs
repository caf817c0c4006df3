use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Error;
use crate::model::SavedResponse;
use crate::questionnaire::Questionnaire;

use super::path::FieldPath;
use super::progress::{ProgressReport, SectionProgress, calculate_progress};
use super::schema::FieldSchema;
use super::state::{FormState, FormStateError};
use super::value::FormValue;

/// Serialized view of a form at one instant, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub responses: String,
    pub section_progress: String,
    pub progress: u8,
    pub has_content: bool,
}

/// Live values of one questionnaire instance plus their derived progress.
///
/// Progress is recomputed synchronously on every change, so `progress()`
/// always matches `state()`.
#[derive(Debug, Clone)]
pub struct FormEngine {
    questionnaire: Arc<Questionnaire>,
    state: FormState,
    progress: ProgressReport,
}

impl FormEngine {
    /// Starts from the questionnaire's all-empty template.
    #[must_use]
    pub fn new(questionnaire: Arc<Questionnaire>) -> Self {
        let state = questionnaire.template().clone();
        let progress = calculate_progress(questionnaire.schema(), &state);
        Self {
            questionnaire,
            state,
            progress,
        }
    }

    #[must_use]
    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        self.questionnaire.schema()
    }

    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressReport {
        &self.progress
    }

    /// Reads the current value at a dot-separated path.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<&FormValue> {
        let path = FieldPath::parse(path).ok()?;
        self.state.get(&path)
    }

    /// Replaces one field and recomputes progress.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` for a malformed path and `Error::State` when the
    /// path is not part of this form. The state is unchanged on error.
    pub fn set_field(
        &mut self,
        path: &str,
        value: impl Into<FormValue>,
    ) -> Result<&ProgressReport, Error> {
        let path = FieldPath::parse(path)?;
        self.state.set_field(&path, value.into())?;
        self.recompute();
        Ok(&self.progress)
    }

    /// Loads persisted `responses` JSON over the empty template.
    ///
    /// Malformed input is logged and ignored; the current values stay in
    /// place. Returns whether the saved values were applied.
    pub fn hydrate(&mut self, responses: &str) -> bool {
        match FormState::parse_fields(responses) {
            Ok(persisted) => {
                let mut state = self.questionnaire.template().clone();
                state.merge_from(persisted);
                self.state = state;
                self.recompute();
                true
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable saved responses");
                false
            }
        }
    }

    /// Hydrates from a saved response record.
    ///
    /// Progress is always recomputed from the restored values; the stored
    /// section progress is only compared, so a schema that changed since the
    /// save shows up in the logs instead of on screen.
    pub fn hydrate_saved(&mut self, saved: &SavedResponse) -> bool {
        if !self.hydrate(&saved.responses) {
            return false;
        }
        match SectionProgress::from_json(&saved.section_progress) {
            Ok(stored) if stored != self.progress.sections => {
                debug!(
                    assignment_id = %saved.assignment_id,
                    stored = ?stored.as_slice(),
                    computed = ?self.progress.sections.as_slice(),
                    "saved section progress differs from recomputed values"
                );
            }
            Ok(_) => {}
            Err(err) => {
                debug!(assignment_id = %saved.assignment_id, error = %err, "unreadable saved section progress");
            }
        }
        true
    }

    /// Drops every value back to the template.
    pub fn reset(&mut self) {
        self.state = self.questionnaire.template().clone();
        self.recompute();
    }

    /// # Errors
    ///
    /// Returns `FormStateError::Json` if serialization fails.
    pub fn snapshot(&self) -> Result<FormSnapshot, FormStateError> {
        Ok(FormSnapshot {
            responses: self.state.to_json()?,
            section_progress: self.progress.sections.to_json()?,
            progress: self.progress.overall,
            has_content: self.state.has_any_content(),
        })
    }

    fn recompute(&mut self) {
        self.progress = calculate_progress(self.questionnaire.schema(), &self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::{SectionDef, flag, text};
    use crate::model::{AssignmentId, ResponseId};
    use crate::time::fixed_now;

    const SECTIONS: &[SectionDef] = &[
        SectionDef {
            id: 1,
            title: "One",
            description: "",
            icon: "",
            fields: &[text("one.name"), flag("one.agree")],
        },
        SectionDef {
            id: 2,
            title: "Two",
            description: "",
            icon: "",
            fields: &[text("two.story")],
        },
    ];

    fn test_engine() -> FormEngine {
        let questionnaire =
            Questionnaire::from_defs("test", "Test", SECTIONS, &[text("notes")]).unwrap();
        FormEngine::new(Arc::new(questionnaire))
    }

    fn saved(responses: &str, section_progress: &str) -> SavedResponse {
        SavedResponse {
            id: ResponseId::new(1),
            assignment_id: AssignmentId::new(3),
            responses: responses.to_string(),
            progress: 0,
            section_progress: section_progress.to_string(),
            started_at: fixed_now(),
            completed_at: None,
            last_saved_at: None,
        }
    }

    #[test]
    fn set_field_updates_progress() {
        let mut engine = test_engine();
        assert_eq!(engine.progress().overall, 0);

        let report = engine.set_field("one.agree", true).unwrap().clone();
        assert_eq!(report.sections.as_slice(), &[50, 0]);
        assert_eq!(report.overall, 33);
        assert_eq!(engine.value("one.agree"), Some(&FormValue::Flag(true)));
    }

    #[test]
    fn untracked_fields_do_not_move_progress() {
        let mut engine = test_engine();
        engine.set_field("notes", "remember to call").unwrap();
        assert_eq!(engine.progress().overall, 0);
        assert!(engine.state().has_any_content());
    }

    #[test]
    fn set_field_rejects_unknown_and_malformed_paths() {
        let mut engine = test_engine();
        assert!(matches!(
            engine.set_field("one.unknown", "x"),
            Err(Error::State(FormStateError::UnknownPath(_)))
        ));
        assert!(matches!(engine.set_field("one..name", "x"), Err(Error::Path(_))));
        assert!(!engine.state().has_any_content());
    }

    #[test]
    fn hydrate_merges_over_template() {
        let mut engine = test_engine();
        assert!(engine.hydrate(r#"{"one":{"name":"Ada"}}"#));
        assert_eq!(engine.value("one.name"), Some(&FormValue::from("Ada")));
        assert_eq!(engine.value("one.agree"), Some(&FormValue::Flag(false)));
        assert_eq!(engine.value("two.story"), Some(&FormValue::from("")));
        assert_eq!(engine.progress().sections.as_slice(), &[50, 0]);
    }

    #[test]
    fn hydrate_keeps_tracked_paths_when_shapes_disagree() {
        let mut engine = test_engine();
        assert!(engine.hydrate(r#"{"one":"oops","two":{"story":{"x":"y"}}}"#));
        assert!(engine.schema().check_against(engine.state()).is_empty());
        assert_eq!(engine.value("two.story"), Some(&FormValue::from("")));

        engine.set_field("one.name", "Ada").unwrap();
        assert_eq!(engine.progress().sections.as_slice(), &[50, 0]);
    }

    #[test]
    fn hydrate_skips_unsupported_leaves_and_keeps_the_rest() {
        let mut engine = test_engine();
        assert!(engine.hydrate(r#"{"one":{"name":"Ada","agree":3},"two":{"story":"kept"}}"#));
        assert_eq!(engine.value("one.name"), Some(&FormValue::from("Ada")));
        assert_eq!(engine.value("one.agree"), Some(&FormValue::Flag(false)));
        assert_eq!(engine.value("two.story"), Some(&FormValue::from("kept")));
        assert_eq!(engine.progress().sections.as_slice(), &[50, 100]);
    }

    #[test]
    fn malformed_hydration_keeps_current_values() {
        let mut engine = test_engine();
        engine.set_field("two.story", "kept").unwrap();
        assert!(!engine.hydrate("{oops"));
        assert!(!engine.hydrate("[]"));
        assert_eq!(engine.value("two.story"), Some(&FormValue::from("kept")));
    }

    #[test]
    fn hydrate_saved_recomputes_progress() {
        let mut engine = test_engine();
        let record = saved(r#"{"two":{"story":"long ago"}}"#, "[100,100]");
        assert!(engine.hydrate_saved(&record));
        assert_eq!(engine.progress().sections.as_slice(), &[0, 100]);
    }

    #[test]
    fn snapshot_round_trips_through_hydrate() {
        let mut engine = test_engine();
        engine.set_field("one.name", "Ada").unwrap();
        engine.set_field("one.agree", true).unwrap();
        let snapshot = engine.snapshot().unwrap();
        assert!(snapshot.has_content);
        assert_eq!(snapshot.section_progress, "[100,0]");

        let mut fresh = test_engine();
        assert!(fresh.hydrate(&snapshot.responses));
        assert_eq!(fresh.state(), engine.state());
        assert_eq!(fresh.progress(), engine.progress());
    }

    #[test]
    fn reset_returns_to_template() {
        let mut engine = test_engine();
        engine.set_field("one.name", "Ada").unwrap();
        engine.reset();
        assert_eq!(engine.state(), engine.questionnaire().template());
    }
}
