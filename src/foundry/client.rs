//! Thin authenticated JSON client over the agent service REST API.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::auth::Credential;
use super::types::RawErrorBody;
use crate::agent::AgentError;

pub const API_VERSION: &str = "v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct FoundryClient {
    http: Client,
    endpoint: String,
    credential: Credential,
}

impl FoundryClient {
    pub fn new(endpoint: &str, credential: Credential) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential_source(&self) -> &'static str {
        self.credential.source()
    }

    pub async fn get<T: DeserializeOwned>(&mut self, path: &str) -> Result<T, AgentError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(&mut self, path: &str, body: &Value) -> Result<T, AgentError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<(), AgentError> {
        self.send::<Value>(Method::DELETE, path, None).await.map(|_| ())
    }

    async fn send<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, AgentError> {
        let url = request_url(&self.endpoint, path);
        let token = self.credential.token().await?;
        tracing::debug!(%method, %url, "agent service request");

        let mut request = self.http.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.credential.invalidate();
            }
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status,
                message: error_message(status, &body),
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return serde_json::from_value(Value::Null).map_err(AgentError::from);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Join endpoint and path, adding the api-version query parameter.
pub fn request_url(endpoint: &str, path: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{}/{}{}api-version={}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/'),
        separator,
        API_VERSION
    )
}

/// Best human-readable message from an error response body.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<RawErrorBody>(body) {
        match (parsed.error.code, parsed.error.message) {
            (Some(code), Some(message)) => return format!("{} ({})", message, code),
            (None, Some(message)) => return message,
            _ => {}
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.chars().take(300).collect()
    }
}
