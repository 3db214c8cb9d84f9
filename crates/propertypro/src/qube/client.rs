use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::domain::{CasePayload, NewComment, QubeCase};
use crate::config::QubeConfig;
use crate::properties::PropertyId;

#[derive(Debug, thiserror::Error)]
pub enum QubeError {
    #[error("qube client is not configured: set QUBE_CLIENT_ID and QUBE_CLIENT_SECRET")]
    NotConfigured,
    #[error("invalid qube url: {0}")]
    InvalidUrl(String),
    #[error("qube request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("qube returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Remote case store.
#[async_trait]
pub trait CaseGateway: Send + Sync {
    /// Updates `existing` when given, otherwise creates a case. Returns the case id.
    async fn upsert_case(
        &self,
        payload: &CasePayload,
        existing: Option<&str>,
    ) -> Result<String, QubeError>;
    async fn list_cases(&self, property_ids: &[PropertyId]) -> Result<Vec<QubeCase>, QubeError>;
    async fn get_case(&self, case_id: &str) -> Result<QubeCase, QubeError>;
    async fn add_comment(
        &self,
        case_id: &str,
        comment: &NewComment,
    ) -> Result<serde_json::Value, QubeError>;
}

#[derive(Debug, Clone)]
pub struct QubeClient {
    http: reqwest::Client,
    base: Url,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct CaseIdResponse {
    case_id: String,
}

#[derive(Deserialize)]
struct CaseListResponse {
    #[serde(default)]
    cases: Vec<QubeCase>,
}

impl QubeClient {
    pub fn new(config: &QubeConfig) -> Result<Self, QubeError> {
        let base = Url::parse(config.api_url.trim_end_matches('/'))
            .map_err(|err| QubeError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(QubeError::InvalidUrl(config.api_url.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// `base` joined with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, QubeError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| QubeError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn token(&self) -> Result<String, QubeError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(QubeError::NotConfigured);
        };
        let response = self
            .http
            .post(self.endpoint(&["auth", "token"])?)
            .json(&json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "grant_type": "client_credentials",
            }))
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;
        debug!("obtained qube access token");
        Ok(token.access_token)
    }

    async fn authorized(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, QubeError> {
        let token = self.token().await?;
        Ok(self
            .http
            .request(method, self.endpoint(segments)?)
            .bearer_auth(token))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, QubeError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(QubeError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl CaseGateway for QubeClient {
    async fn upsert_case(
        &self,
        payload: &CasePayload,
        existing: Option<&str>,
    ) -> Result<String, QubeError> {
        let request = match existing {
            Some(case_id) => self.authorized(Method::PUT, &["cases", case_id]).await?,
            None => self.authorized(Method::POST, &["cases"]).await?,
        };
        let response = request.json(payload).send().await?;
        let created: CaseIdResponse = read_json(response).await?;
        info!(
            case_id = %created.case_id,
            ticket_id = %payload.metadata.internal_ticket_id,
            updated = existing.is_some(),
            "synced qube case"
        );
        Ok(created.case_id)
    }

    async fn list_cases(&self, property_ids: &[PropertyId]) -> Result<Vec<QubeCase>, QubeError> {
        let query: Vec<(&str, String)> = property_ids
            .iter()
            .map(|id| ("property_ids", id.to_string()))
            .collect();
        let response = self
            .authorized(Method::GET, &["cases"])
            .await?
            .query(&query)
            .send()
            .await?;
        let listed: CaseListResponse = read_json(response).await?;
        Ok(listed.cases)
    }

    async fn get_case(&self, case_id: &str) -> Result<QubeCase, QubeError> {
        let response = self
            .authorized(Method::GET, &["cases", case_id])
            .await?
            .send()
            .await?;
        read_json(response).await
    }

    async fn add_comment(
        &self,
        case_id: &str,
        comment: &NewComment,
    ) -> Result<serde_json::Value, QubeError> {
        let response = self
            .authorized(Method::POST, &["cases", case_id, "comments"])
            .await?
            .json(comment)
            .send()
            .await?;
        read_json(response).await
    }
}
