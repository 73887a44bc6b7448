//! Runtime configuration resolved from CLI args, settings file and environment.

use anyhow::{bail, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{AgentKind, Args};
use crate::settings::{FoundrySettings, Workspace};

/// Default display name of the mock agent.
const MOCK_AGENT_NAME: &str = "MockBot";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "AGENT_CLI_LOG";

const ENV_ENDPOINT: &str = "AZURE_EXISTING_AIPROJECT_ENDPOINT";
const ENV_DEPLOYMENT: &str = "AZURE_AI_AGENT_DEPLOYMENT_NAME";
const ENV_AGENT_NAME: &str = "AZURE_AI_AGENT_NAME";
const ENV_AGENT_ID: &str = "AZURE_AI_AGENT_ID";
const ENV_LANGUAGE: &str = "AZURE_AI_BING_LANGUAGE";
const ENV_ACCESS_TOKEN: &str = "AZURE_AI_ACCESS_TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub agent: AgentKind,
    /// Display/identity label of the agent.
    pub agent_name: String,
    pub history_file: PathBuf,
    /// Entries shown by the `history` command.
    pub history_recent: usize,
    /// Persisted remote session state, next to the history file.
    pub state_file: PathBuf,
    pub mock: MockConfig,
    pub max_width: usize,
    /// Present only when the foundry agent is selected.
    pub foundry: Option<FoundryConfig>,
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub tool_call_probability: f64,
    pub seed: Option<u64>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            tool_call_probability: 0.3,
            seed: None,
        }
    }
}

/// Connection settings for the hosted agent service.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundryConfig {
    pub project_endpoint: String,
    pub deployment_name: String,
    pub agent_name: String,
    pub agent_id: Option<String>,
    pub language: String,
    pub instructions: String,
    pub access_token: Option<String>,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

impl FoundryConfig {
    /// Load from the process environment.
    pub fn from_environment(agent_name: Option<&str>, settings: &FoundrySettings) -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), agent_name, settings)
    }

    /// Load using an arbitrary variable lookup. `agent_name` overrides
    /// `AZURE_AI_AGENT_NAME`.
    pub fn from_lookup<F>(lookup: F, agent_name: Option<&str>, settings: &FoundrySettings) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let project_endpoint = get(ENV_ENDPOINT);
        let deployment_name = get(ENV_DEPLOYMENT);
        let agent_name = agent_name
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .or_else(|| get(ENV_AGENT_NAME));

        let mut missing = Vec::new();
        if project_endpoint.is_none() {
            missing.push(ENV_ENDPOINT);
        }
        if deployment_name.is_none() {
            missing.push(ENV_DEPLOYMENT);
        }
        if agent_name.is_none() {
            missing.push(ENV_AGENT_NAME);
        }
        let (Some(project_endpoint), Some(deployment_name), Some(agent_name)) =
            (project_endpoint, deployment_name, agent_name)
        else {
            bail!("Missing required environment variables: {}", missing.join(", "));
        };

        let config = FoundryConfig {
            project_endpoint: project_endpoint.trim_end_matches('/').to_string(),
            deployment_name,
            agent_name,
            agent_id: get(ENV_AGENT_ID),
            language: get(ENV_LANGUAGE).unwrap_or_else(|| "en-US".to_string()),
            instructions: settings.instructions.clone(),
            access_token: get(ENV_ACCESS_TOKEN),
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(50)),
            run_timeout: Duration::from_secs(settings.run_timeout_secs.max(1)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.project_endpoint.starts_with("https://") || self.project_endpoint.starts_with("http://")) {
            bail!("Project endpoint must be a valid URL: '{}'", self.project_endpoint);
        }
        if self.deployment_name.trim().is_empty() {
            bail!("Deployment name cannot be empty");
        }
        if self.agent_name.trim().is_empty() {
            bail!("Agent name cannot be empty");
        }
        Ok(())
    }
}

impl Config {
    /// Build the runtime config. Fails when the foundry agent is selected but
    /// its environment is incomplete.
    pub fn from_args(args: Args, workspace: Workspace) -> Result<Self> {
        Self::resolve(args, workspace, |key| env::var(key).ok())
    }

    fn resolve<F>(args: Args, workspace: Workspace, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = workspace.settings;

        let history_file = resolve_path(
            &workspace.root,
            args.history_file.as_deref().unwrap_or(&settings.history.file),
        );
        let state_file = history_file
            .parent()
            .map(|dir| dir.join("session.json"))
            .unwrap_or_else(|| PathBuf::from("session.json"));

        let mock_settings = &settings.mock;
        if mock_settings.min_delay_ms > mock_settings.max_delay_ms {
            bail!(
                "mock.min_delay_ms ({}) must not exceed mock.max_delay_ms ({})",
                mock_settings.min_delay_ms,
                mock_settings.max_delay_ms
            );
        }
        if !(0.0..=1.0).contains(&mock_settings.tool_call_probability) {
            bail!(
                "mock.tool_call_probability must be between 0 and 1, got {}",
                mock_settings.tool_call_probability
            );
        }
        let mock = MockConfig {
            min_delay: Duration::from_millis(mock_settings.min_delay_ms),
            max_delay: Duration::from_millis(mock_settings.max_delay_ms),
            tool_call_probability: mock_settings.tool_call_probability,
            seed: args.seed,
        };

        let foundry = match args.agent {
            AgentKind::Mock => None,
            AgentKind::Foundry => Some(FoundryConfig::from_lookup(
                &lookup,
                args.agent_name.as_deref(),
                &settings.foundry,
            )?),
        };

        let agent_name = match (&foundry, args.agent_name) {
            (Some(foundry), _) => foundry.agent_name.clone(),
            (None, Some(name)) if !name.trim().is_empty() => name,
            (None, _) => MOCK_AGENT_NAME.to_string(),
        };

        let log_filter = args
            .log_level
            .or_else(|| lookup(LOG_ENV))
            .unwrap_or_else(|| "warn".to_string());

        Ok(Config {
            agent: args.agent,
            agent_name,
            history_file,
            history_recent: args.history_limit.unwrap_or(settings.history.recent).max(1),
            state_file,
            mock,
            max_width: settings.render.max_width.max(40),
            foundry,
            log_filter,
        })
    }
}

fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
