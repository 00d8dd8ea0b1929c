use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::registry::RemoteId;
use crate::row::cell_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    Post,
    Patch,
}

impl From<SubmitMethod> for Method {
    fn from(method: SubmitMethod) -> Method {
        match method {
            SubmitMethod::Post => Method::POST,
            SubmitMethod::Patch => Method::PATCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub method: SubmitMethod,
    pub url: String,
    pub body: Value,
}

/// The remote tournament service, seen as a JSON CRUD store addressed by URL.
/// Any non-success status comes back as [`ApiError::Rejected`].
#[async_trait]
pub trait TournamentApi: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, ApiError>;
    async fn submit(&self, request: &SubmissionRequest) -> Result<Value, ApiError>;
}

/// The identifier of a created or fetched object: its `url`, or failing that its `id`.
pub fn extract_identifier(body: &Value) -> Option<RemoteId> {
    body.get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| body.get("id").and_then(cell_text))
}

pub struct HttpApi {
    client: reqwest::Client,
    token: String,
}

impl HttpApi {
    pub fn new(token: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpApi {
            client: builder.build()?,
            token: token.into(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Token {}", self.token))
    }

    async fn read_response(response: Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Rejected { status: status.as_u16(), body });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TournamentApi for HttpApi {
    async fn fetch(&self, url: &str) -> Result<Value, ApiError> {
        debug!("GET {}", url);
        let response = self.authorized(self.client.get(url)).send().await?;
        Self::read_response(response).await
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<Value, ApiError> {
        debug!("{:?} {}", request.method, request.url);
        let response = self
            .authorized(self.client.request(request.method.into(), &request.url))
            .json(&request.body)
            .send()
            .await?;
        Self::read_response(response).await
    }
}
