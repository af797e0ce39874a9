//! HTTP implementation of [`PlanningApi`]

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use sprintboard_core::models::{
    ApiConfig, BacklogFilter, Issue, IssueDraft, Sprint, SprintDraft,
};
use std::time::Duration;

use crate::api::PlanningApi;
use crate::auth::ApiAuth;
use crate::types::{ApiErrorBody, AssignSprintRequest};
use crate::{Error, Result};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<ApiAuth>,
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Option<ApiAuth>, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Build a client from config. Without a configured token the keyring
    /// entry for `username` is used; a missing entry means anonymous access.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let auth = match (&config.token, &config.username) {
            (Some(token), _) => Some(ApiAuth::new(token.clone())),
            (None, Some(username)) => match ApiAuth::from_keyring(username) {
                Ok(auth) => Some(auth),
                Err(Error::Keyring(keyring::Error::NoEntry)) => {
                    tracing::warn!("No keyring token for '{}', continuing without auth", username);
                    None
                }
                Err(e) => return Err(e),
            },
            (None, None) => None,
        };

        Self::new(
            &config.base_url,
            auth,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self.http.request(method, url);
        if let Some(ref auth) = self.auth {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth.to_bearer());
        }
        Ok(builder)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = Self::check(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        tracing::warn!("Request to {} failed with {}: {}", url, status, message);

        Err(match status {
            StatusCode::NOT_FOUND => Error::NotFound(url),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl PlanningApi for ApiClient {
    async fn list_sprints(&self, project_id: &str) -> Result<Vec<Sprint>> {
        let builder = self.request(Method::GET, &["projects", project_id, "sprints"])?;
        self.send_json(builder).await
    }

    async fn list_backlog(&self, project_id: &str, filter: &BacklogFilter) -> Result<Vec<Issue>> {
        let builder = self
            .request(Method::GET, &["projects", project_id, "backlog"])?
            .query(&filter.query_pairs());
        self.send_json(builder).await
    }

    async fn assign_sprint(&self, sprint_id: Option<&str>, issue_ids: &[String]) -> Result<()> {
        let body = AssignSprintRequest {
            sprint_id: sprint_id.map(str::to_string),
            issue_ids: issue_ids.to_vec(),
        };
        let builder = self.request(Method::PUT, &["issues", "sprint"])?.json(&body);
        self.send_empty(builder).await
    }

    async fn start_sprint(&self, sprint_id: &str) -> Result<()> {
        let builder = self.request(Method::POST, &["sprints", sprint_id, "start"])?;
        self.send_empty(builder).await
    }

    async fn complete_sprint(&self, sprint_id: &str) -> Result<()> {
        let builder = self.request(Method::POST, &["sprints", sprint_id, "complete"])?;
        self.send_empty(builder).await
    }

    async fn delete_sprint(&self, sprint_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["sprints", sprint_id])?;
        self.send_empty(builder).await
    }

    async fn delete_issue(&self, issue_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["issues", issue_id])?;
        self.send_empty(builder).await
    }

    async fn create_sprint(&self, project_id: &str, draft: &SprintDraft) -> Result<Sprint> {
        draft.validate()?;
        let builder = self
            .request(Method::POST, &["projects", project_id, "sprints"])?
            .json(draft);
        self.send_json(builder).await
    }

    async fn update_sprint(&self, sprint_id: &str, draft: &SprintDraft) -> Result<Sprint> {
        draft.validate()?;
        let builder = self.request(Method::PUT, &["sprints", sprint_id])?.json(draft);
        self.send_json(builder).await
    }

    async fn create_issue(&self, project_id: &str, draft: &IssueDraft) -> Result<Issue> {
        draft.validate()?;
        let builder = self
            .request(Method::POST, &["projects", project_id, "issues"])?
            .json(draft);
        self.send_json(builder).await
    }
}
