use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info};

use careplan_core::model::{AssignmentId, SaveResponseRequest, SavedResponse};

use crate::config::ApiConfig;
use crate::error::GatewayError;
use crate::gateway::{DocumentExporter, ResponseGateway};

/// Gateway talking to the care-planning REST API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: ApiConfig,
}

impl HttpGateway {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn response_url(&self, assignment_id: AssignmentId) -> String {
        self.endpoint(&format!("assignments/{assignment_id}/response"))
    }

    fn pdf_url(&self, assignment_id: AssignmentId) -> String {
        self.endpoint(&format!("assignments/{assignment_id}/pdf"))
    }

    fn save_url(&self) -> String {
        self.endpoint("responses")
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ResponseGateway for HttpGateway {
    async fn load(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<SavedResponse>, GatewayError> {
        let response = self
            .authorize(self.client.get(self.response_url(assignment_id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(assignment_id = %assignment_id, "no saved response");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GatewayError::HttpStatus(response.status()));
        }

        Ok(response.json::<Option<SavedResponse>>().await?)
    }

    async fn save(&self, request: &SaveResponseRequest) -> Result<SavedResponse, GatewayError> {
        let response = self
            .authorize(self.client.post(self.save_url()))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::HttpStatus(response.status()));
        }

        let saved: SavedResponse = response.json().await?;
        info!(
            assignment_id = %saved.assignment_id,
            progress = saved.progress,
            "response saved remotely"
        );
        Ok(saved)
    }
}

#[async_trait]
impl DocumentExporter for HttpGateway {
    async fn export_pdf(&self, assignment_id: AssignmentId) -> Result<Vec<u8>, GatewayError> {
        let response = self
            .authorize(self.client.get(self.pdf_url(assignment_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::HttpStatus(response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn gateway(base: &str) -> HttpGateway {
        HttpGateway::new(ApiConfig::new(Url::parse(base).unwrap()))
    }

    #[test]
    fn endpoints_join_onto_base_path() {
        let gw = gateway("https://care.example.org/api/");
        assert_eq!(
            gw.response_url(AssignmentId::new(12)),
            "https://care.example.org/api/assignments/12/response"
        );
        assert_eq!(
            gw.pdf_url(AssignmentId::new(12)),
            "https://care.example.org/api/assignments/12/pdf"
        );
        assert_eq!(gw.save_url(), "https://care.example.org/api/responses");
    }

    #[test]
    fn endpoints_work_without_trailing_slash() {
        let gw = gateway("http://localhost:8080");
        assert_eq!(gw.save_url(), "http://localhost:8080/responses");
    }

    #[test]
    fn bearer_token_is_attached_when_configured() {
        let config = ApiConfig::new(Url::parse("http://localhost:8080").unwrap()).with_token("abc");
        let gw = HttpGateway::new(config);
        let request = gw
            .authorize(gw.client.get(gw.save_url()))
            .build()
            .unwrap();
        let header = request.headers().get(reqwest::header::AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer abc");

        let anonymous = gateway("http://localhost:8080");
        let request = anonymous
            .authorize(anonymous.client.get(anonymous.save_url()))
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }
}
