//! Bearer token acquisition for the agent service.

use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::agent::AgentError;

/// Audience of tokens issued for the agent service.
pub const TOKEN_RESOURCE: &str = "https://ai.azure.com";

/// Tokens from the Azure CLI live about an hour; refresh well before that.
const CLI_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
pub enum Credential {
    /// Token supplied through the environment. Never refreshed.
    Static(String),
    /// Token fetched from `az account get-access-token` and cached.
    AzureCli { cached: Option<(String, Instant)> },
}

impl Credential {
    pub fn new(access_token: Option<String>) -> Self {
        match access_token {
            Some(token) => Credential::Static(token),
            None => Credential::AzureCli { cached: None },
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Credential::Static(_) => "environment",
            Credential::AzureCli { .. } => "azure cli",
        }
    }

    pub async fn token(&mut self) -> Result<String, AgentError> {
        match self {
            Credential::Static(token) => Ok(token.clone()),
            Credential::AzureCli { cached } => {
                if let Some((token, fetched_at)) = cached {
                    if fetched_at.elapsed() < CLI_TOKEN_TTL {
                        return Ok(token.clone());
                    }
                }
                let token = fetch_cli_token().await?;
                *cached = Some((token.clone(), Instant::now()));
                Ok(token)
            }
        }
    }

    /// Forget a cached token, e.g. after the service rejected it.
    pub fn invalidate(&mut self) {
        if let Credential::AzureCli { cached } = self {
            *cached = None;
        }
    }
}

async fn fetch_cli_token() -> Result<String, AgentError> {
    tracing::debug!("requesting access token from azure cli");
    let output = Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            TOKEN_RESOURCE,
            "--query",
            "accessToken",
            "--output",
            "tsv",
        ])
        .output()
        .await
        .map_err(|e| {
            AgentError::Auth(format!(
                "could not run 'az' ({}); set AZURE_AI_ACCESS_TOKEN or install the Azure CLI",
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AgentError::Auth(format!(
            "'az account get-access-token' failed: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(AgentError::Auth("azure cli returned an empty token".to_string()));
    }
    Ok(token)
}
