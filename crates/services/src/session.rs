//! One questionnaire being filled in for one assignment.
//!
//! A `FormSession` wires a `FormEngine` to a persistence gateway: edits
//! recompute progress immediately and, when they carry real content, arm a
//! debounced autosave. Manual saves bypass the timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use careplan_core::Questionnaire;
use careplan_core::form::{
    FormEngine, FormSnapshot, FormValue, ProgressReport, Section, SectionNavigator,
};
use careplan_core::model::{Assignment, MemberId, SaveResponseRequest, SavedResponse};

use crate::autosave::{AutosaveScheduler, SaveStatus, SaveStatusTracker};
use crate::config::AutosaveConfig;
use crate::error::FormSessionError;
use crate::gateway::{DocumentExporter, ResponseGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveTrigger {
    Auto,
    Manual,
}

impl SaveTrigger {
    fn as_str(self) -> &'static str {
        match self {
            SaveTrigger::Auto => "auto",
            SaveTrigger::Manual => "manual",
        }
    }
}

struct SessionInner {
    engine: Mutex<FormEngine>,
    assignment: Option<Assignment>,
    member_id: MemberId,
    gateway: Arc<dyn ResponseGateway>,
    config: AutosaveConfig,
    status: SaveStatusTracker,
    manual_save: AtomicBool,
    last_saved_at: Mutex<Option<DateTime<Utc>>>,
}

impl SessionInner {
    fn engine(&self) -> Result<MutexGuard<'_, FormEngine>, FormSessionError> {
        self.engine.lock().map_err(|_| FormSessionError::Poisoned)
    }

    fn autosave_ready(&self, report: &ProgressReport, has_content: bool) -> bool {
        self.config.enabled && self.assignment.is_some() && report.overall > 0 && has_content
    }

    /// Re-evaluates the autosave conditions against the current values.
    fn ready_now(&self) -> bool {
        match self.engine() {
            Ok(engine) => self.autosave_ready(engine.progress(), engine.state().has_any_content()),
            Err(_) => false,
        }
    }

    async fn save(&self, trigger: SaveTrigger) -> Result<SavedResponse, FormSessionError> {
        let assignment = self
            .assignment
            .as_ref()
            .ok_or(FormSessionError::Unassigned)?;
        let snapshot = {
            let engine = self.engine()?;
            engine.snapshot()?
        };
        let request = SaveResponseRequest {
            assignment_id: assignment.id,
            member_id: self.member_id,
            document_id: assignment.document_id,
            responses: snapshot.responses,
            progress: snapshot.progress,
            section_progress: snapshot.section_progress,
            auto_save_enabled: self.config.enabled,
        };

        self.status.saving();
        match self.gateway.save(&request).await {
            Ok(saved) => {
                let mut last = self
                    .last_saved_at
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                *last = saved.last_saved_at.or(*last);
                drop(last);

                info!(
                    assignment_id = %assignment.id,
                    progress = saved.progress,
                    trigger = trigger.as_str(),
                    "form saved"
                );
                self.status.saved();
                Ok(saved)
            }
            Err(err) => {
                error!(
                    assignment_id = %assignment.id,
                    trigger = trigger.as_str(),
                    error = %err,
                    "form save failed"
                );
                self.status.failed(err.to_string());
                Err(err.into())
            }
        }
    }
}

/// Clears the manual-save flag even if the save future is dropped midway.
struct ManualSaveGuard<'a>(&'a AtomicBool);

impl Drop for ManualSaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FormSession {
    questionnaire: Arc<Questionnaire>,
    inner: Arc<SessionInner>,
    navigator: SectionNavigator,
    scheduler: AutosaveScheduler,
}

impl FormSession {
    /// Starts a session, hydrating from `assignment.initial_data` when present.
    ///
    /// Hydration never arms the autosave timer.
    #[must_use]
    pub fn new(
        questionnaire: Arc<Questionnaire>,
        assignment: Option<Assignment>,
        member_id: MemberId,
        gateway: Arc<dyn ResponseGateway>,
        config: AutosaveConfig,
    ) -> Self {
        let mut engine = FormEngine::new(Arc::clone(&questionnaire));
        let mut last_saved_at = None;
        if let Some(saved) = assignment.as_ref().and_then(|a| a.initial_data.as_ref()) {
            if engine.hydrate_saved(saved) {
                last_saved_at = saved.last_saved_at;
            }
        }

        let navigator = SectionNavigator::new(questionnaire.schema().len());
        let inner = Arc::new(SessionInner {
            engine: Mutex::new(engine),
            assignment,
            member_id,
            gateway,
            config,
            status: SaveStatusTracker::new(config.status_display),
            manual_save: AtomicBool::new(false),
            last_saved_at: Mutex::new(last_saved_at),
        });

        Self {
            questionnaire,
            inner,
            navigator,
            scheduler: AutosaveScheduler::new(config.quiet_period),
        }
    }

    /// Like [`FormSession::new`], but fetches the saved response through the
    /// gateway when the assignment carries none. A failed load is logged and
    /// the form starts empty.
    pub async fn open(
        questionnaire: Arc<Questionnaire>,
        mut assignment: Option<Assignment>,
        member_id: MemberId,
        gateway: Arc<dyn ResponseGateway>,
        config: AutosaveConfig,
    ) -> Self {
        if let Some(target) = assignment.as_mut().filter(|a| a.initial_data.is_none()) {
            match gateway.load(target.id).await {
                Ok(found) => target.initial_data = found,
                Err(err) => {
                    warn!(assignment_id = %target.id, error = %err, "could not load saved response");
                }
            }
        }
        Self::new(questionnaire, assignment, member_id, gateway, config)
    }

    #[must_use]
    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    #[must_use]
    pub fn assignment(&self) -> Option<&Assignment> {
        self.inner.assignment.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> AutosaveConfig {
        self.inner.config
    }

    /// Sets one field, recomputes progress and, if the form now qualifies,
    /// restarts the autosave timer. An edit that leaves the form without
    /// progress or content cancels any pending timer.
    ///
    /// # Errors
    ///
    /// Returns `FormSessionError::Form` for malformed or unknown paths.
    pub fn set_field(
        &self,
        path: &str,
        value: impl Into<FormValue>,
    ) -> Result<ProgressReport, FormSessionError> {
        let (report, has_content) = {
            let mut engine = self.inner.engine()?;
            let report = engine.set_field(path, value)?.clone();
            (report, engine.state().has_any_content())
        };

        if self.inner.autosave_ready(&report, has_content) {
            self.arm_autosave();
        } else {
            self.scheduler.cancel();
        }
        Ok(report)
    }

    fn arm_autosave(&self) {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let armed = self.scheduler.schedule(move || async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.ready_now() {
                debug!("skipping autosave, form no longer qualifies");
                return;
            }
            // Failures are already logged and published as status.
            let _ = inner.save(SaveTrigger::Auto).await;
        });
        if armed {
            if let Some(assignment) = &self.inner.assignment {
                debug!(
                    assignment_id = %assignment.id,
                    quiet_ms = u64::try_from(self.scheduler.quiet_period().as_millis()).unwrap_or(u64::MAX),
                    "autosave armed"
                );
            }
        }
    }

    /// Saves immediately, regardless of progress or the autosave flag.
    ///
    /// # Errors
    ///
    /// Returns `FormSessionError::SaveInProgress` while another manual save
    /// is running, `Unassigned` without an assignment, or the gateway error.
    pub async fn save_now(&self) -> Result<SavedResponse, FormSessionError> {
        if self
            .inner
            .manual_save
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FormSessionError::SaveInProgress);
        }
        let _guard = ManualSaveGuard(&self.inner.manual_save);
        self.inner.save(SaveTrigger::Manual).await
    }

    /// Fetches the PDF for a fully completed form.
    ///
    /// # Errors
    ///
    /// Returns `FormSessionError::Incomplete` below 100%, `Unassigned`
    /// without an assignment, or the exporter's error.
    pub async fn export_pdf(
        &self,
        exporter: &dyn DocumentExporter,
    ) -> Result<Vec<u8>, FormSessionError> {
        let progress = self.inner.engine()?.progress().overall;
        if progress < 100 {
            return Err(FormSessionError::Incomplete { progress });
        }
        let assignment = self
            .inner
            .assignment
            .as_ref()
            .ok_or(FormSessionError::Unassigned)?;
        Ok(exporter.export_pdf(assignment.id).await?)
    }

    /// # Errors
    ///
    /// Returns `FormSessionError::Poisoned` if a previous edit panicked.
    pub fn progress(&self) -> Result<ProgressReport, FormSessionError> {
        Ok(self.inner.engine()?.progress().clone())
    }

    /// # Errors
    ///
    /// Returns `FormSessionError::Poisoned` if a previous edit panicked.
    pub fn value(&self, path: &str) -> Result<Option<FormValue>, FormSessionError> {
        Ok(self.inner.engine()?.value(path).cloned())
    }

    /// # Errors
    ///
    /// Returns `FormSessionError` if the state cannot be serialized.
    pub fn snapshot(&self) -> Result<FormSnapshot, FormSessionError> {
        Ok(self.inner.engine()?.snapshot()?)
    }

    /// Clears every value. Does not save.
    ///
    /// # Errors
    ///
    /// Returns `FormSessionError::Poisoned` if a previous edit panicked.
    pub fn reset(&self) -> Result<(), FormSessionError> {
        self.scheduler.cancel();
        self.inner.engine()?.reset();
        Ok(())
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.inner.status.current()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status.subscribe()
    }

    #[must_use]
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .last_saved_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn has_pending_autosave(&self) -> bool {
        self.scheduler.is_pending()
    }

    #[must_use]
    pub fn current_section_index(&self) -> usize {
        self.navigator.current()
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.questionnaire.schema().section(self.navigator.current())
    }

    pub fn next_section(&mut self) -> bool {
        self.navigator.next()
    }

    pub fn previous_section(&mut self) -> bool {
        self.navigator.previous()
    }

    pub fn go_to_section(&mut self, index: usize) -> bool {
        self.navigator.go_to(index)
    }

    /// Cancels the pending autosave. Dropping the session does the same.
    pub fn close(&self) {
        self.scheduler.cancel();
    }
}
