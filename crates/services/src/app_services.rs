use std::collections::HashMap;
use std::sync::Arc;

use careplan_core::model::{Assignment, MemberId};
use careplan_core::{Questionnaire, QuestionnaireKind};
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::config::{ApiConfig, AutosaveConfig};
use crate::error::AppServicesError;
use crate::gateway::{DocumentExporter, RepositoryGateway, ResponseGateway};
use crate::http::HttpGateway;
use crate::session::FormSession;

/// Assembles the gateway, autosave settings and questionnaires a front end
/// needs to open forms.
#[derive(Clone)]
pub struct AppServices {
    gateway: Arc<dyn ResponseGateway>,
    exporter: Option<Arc<dyn DocumentExporter>>,
    autosave: AutosaveConfig,
    questionnaires: HashMap<QuestionnaireKind, Arc<Questionnaire>>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or a
    /// questionnaire definition is invalid.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        autosave: AutosaveConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(&storage, clock, autosave)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Schema` if a questionnaire definition is
    /// invalid.
    pub fn with_storage(
        storage: &Storage,
        clock: Clock,
        autosave: AutosaveConfig,
    ) -> Result<Self, AppServicesError> {
        let gateway: Arc<dyn ResponseGateway> = Arc::new(RepositoryGateway::new(
            clock,
            Arc::clone(&storage.responses),
        ));
        Self::assemble(gateway, None, autosave)
    }

    /// Build services that persist through the remote API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Schema` if a questionnaire definition is
    /// invalid.
    pub fn new_http(api: ApiConfig, autosave: AutosaveConfig) -> Result<Self, AppServicesError> {
        let http = Arc::new(HttpGateway::new(api));
        let gateway: Arc<dyn ResponseGateway> = http.clone();
        let exporter: Arc<dyn DocumentExporter> = http;
        Self::assemble(gateway, Some(exporter), autosave)
    }

    /// Reads `CAREPLAN_*` settings: the remote API when a base URL is set,
    /// otherwise `SQLite` at `db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for malformed settings or storage failures.
    pub async fn from_env(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let autosave = AutosaveConfig::from_env()?;
        match ApiConfig::from_env()? {
            Some(api) => {
                info!(base_url = %api.base_url, "using remote persistence");
                Self::new_http(api, autosave)
            }
            None => {
                info!(db_url, "using local persistence");
                Self::new_sqlite(db_url, clock, autosave).await
            }
        }
    }

    fn assemble(
        gateway: Arc<dyn ResponseGateway>,
        exporter: Option<Arc<dyn DocumentExporter>>,
        autosave: AutosaveConfig,
    ) -> Result<Self, AppServicesError> {
        let questionnaires = QuestionnaireKind::ALL
            .into_iter()
            .map(|kind| Ok((kind, Arc::new(kind.questionnaire()?))))
            .collect::<Result<HashMap<_, _>, AppServicesError>>()?;
        Ok(Self {
            gateway,
            exporter,
            autosave,
            questionnaires,
        })
    }

    #[must_use]
    pub fn gateway(&self) -> Arc<dyn ResponseGateway> {
        Arc::clone(&self.gateway)
    }

    /// PDF export is only available through the remote API.
    #[must_use]
    pub fn exporter(&self) -> Option<Arc<dyn DocumentExporter>> {
        self.exporter.clone()
    }

    #[must_use]
    pub fn autosave(&self) -> AutosaveConfig {
        self.autosave
    }

    #[must_use]
    pub fn questionnaire(&self, kind: QuestionnaireKind) -> Option<Arc<Questionnaire>> {
        self.questionnaires.get(&kind).cloned()
    }

    /// Opens a form for `assignment`, loading its saved response if the
    /// assignment does not carry one.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Schema` if the questionnaire cannot be built.
    pub async fn open_form(
        &self,
        assignment: Assignment,
        member_id: MemberId,
    ) -> Result<FormSession, AppServicesError> {
        let questionnaire = match self.questionnaire(assignment.kind) {
            Some(questionnaire) => questionnaire,
            None => Arc::new(assignment.kind.questionnaire()?),
        };
        Ok(FormSession::open(
            questionnaire,
            Some(assignment),
            member_id,
            self.gateway(),
            self.autosave,
        )
        .await)
    }
}
