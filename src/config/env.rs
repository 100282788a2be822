//! Build a config document from environment variables, for hosts where
//! shipping a YAML file is awkward.
//!
//! Agents are read from `AGENT_<n>_NAME`, `AGENT_<n>_ID`,
//! `AGENT_<n>_CYCLE_INTERVAL_MINUTES`, `AGENT_<n>_ACTIVATION_INSTRUCTION` and
//! `AGENT_<n>_ENABLED`, starting at n = 1 and stopping at the first index
//! with neither a name nor an id.

use crate::errors::EngineError;
use super::types::{AgentEntry, EngineConfigFile, LettaSection, DEFAULT_TIMEOUT_SECS};
use tracing::warn;

pub const DEFAULT_ENV_INSTRUCTION: &str = "You are an autonomous agent. Review your goals and available tools. \
Assess your current situation and make strategic decisions. Execute actions using your registered tools.";

pub fn config_from_env(env: &dyn Fn(&str) -> Option<String>) -> Result<EngineConfigFile, EngineError> {
    let timeout = match env("LETTA_TIMEOUT") {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            EngineError::Config(format!("LETTA_TIMEOUT must be a whole number of seconds, got '{}'", raw))
        })?,
        None => DEFAULT_TIMEOUT_SECS,
    };

    let letta = LettaSection {
        api_key: Some(env("LETTA_API_KEY").unwrap_or_default()),
        base_url: Some(env("LETTA_BASE_URL").unwrap_or_else(|| crate::client::letta::DEFAULT_BASE_URL.to_string())),
        timeout: Some(timeout),
    };

    let mut agents = Vec::new();
    for index in 1.. {
        let name = env(&format!("AGENT_{}_NAME", index)).filter(|v| !v.is_empty());
        let id = env(&format!("AGENT_{}_ID", index)).filter(|v| !v.is_empty());
        if name.is_none() && id.is_none() {
            break;
        }

        let interval_key = format!("AGENT_{}_CYCLE_INTERVAL_MINUTES", index);
        let interval = match env(&interval_key) {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                EngineError::Config(format!("{} must be a number, got '{}'", interval_key, raw))
            })?,
            None => super::types::DEFAULT_INTERVAL_MINUTES,
        };

        if id.is_none() {
            warn!(index, "AGENT_{}_ID is not set; the agent will be skipped at load time", index);
        }

        agents.push(AgentEntry {
            name: name.unwrap_or_else(|| format!("Agent {}", index)),
            agent_id: id.unwrap_or_default(),
            cycle_interval_minutes: Some(interval),
            activation_instruction: Some(
                env(&format!("AGENT_{}_ACTIVATION_INSTRUCTION", index))
                    .unwrap_or_else(|| DEFAULT_ENV_INSTRUCTION.to_string()),
            ),
            enabled: Some(
                env(&format!("AGENT_{}_ENABLED", index))
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(true),
            ),
            ..Default::default()
        });
    }

    Ok(EngineConfigFile {
        letta: Some(letta),
        agents,
        ..Default::default()
    })
}

pub fn render_yaml(config: &EngineConfigFile) -> Result<String, EngineError> {
    Ok(serde_yaml::to_string(config)?)
}
