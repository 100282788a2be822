use std::time::Duration;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_INTERVAL_MINUTES: f64 = 15.0;
pub const DEFAULT_INSTRUCTION: &str = "What should you do now?";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: f64 = 1.0;
pub const DEFAULT_DATABASE_PATH: &str = "./data/activities.db";

/// On-disk shape of the YAML config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letta: Option<LettaSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSection>,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LettaSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineSection {
    pub shutdown_grace_secs: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageSection {
    pub enabled: Option<bool>,
    pub database_path: Option<String>,
}

/// One agent as written in the file. Both historical spellings of the
/// interval and instruction fields are accepted.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AgentEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_interval_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Accepts scalars of any kind for identifier fields. A blank value reads as
/// an empty string so the entry can be dropped later instead of failing the load.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar identifier, found {:?}",
                other
            )))
        }
    })
}

impl AgentEntry {
    pub fn interval_minutes(&self) -> f64 {
        self.cycle_interval_minutes
            .or(self.interval_minutes)
            .unwrap_or(DEFAULT_INTERVAL_MINUTES)
    }

    pub fn instruction(&self) -> String {
        self.activation_instruction
            .clone()
            .or_else(|| self.prompt.clone())
            .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string())
    }
}

/// Validated description of one agent. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub id: String,
    pub name: String,
    pub interval: Duration,
    pub instruction: String,
    pub enabled: bool,
}

impl AgentSpec {
    pub fn new(id: &str, name: &str, interval: Duration, instruction: &str) -> Self {
        Self {
            id: id.to_string(),
            name: if name.is_empty() { id.to_string() } else { name.to_string() },
            interval,
            instruction: instruction.to_string(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub shutdown_grace: Duration,
    pub agents: Vec<AgentSpec>,
}

impl EngineSpec {
    pub fn new(api_key: &str, agents: Vec<AgentSpec>) -> Self {
        Self {
            base_url: crate::client::letta::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs_f64(DEFAULT_SHUTDOWN_GRACE_SECS),
            agents,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn agent(&self, id: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.id == id)
    }
}

/// Where completed cycles are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSpec {
    pub enabled: bool,
    pub database_path: String,
}

impl Default for StorageSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_names_win_over_old() {
        let entry = AgentEntry {
            cycle_interval_minutes: Some(5.0),
            interval_minutes: Some(30.0),
            activation_instruction: Some("new".into()),
            prompt: Some("old".into()),
            ..Default::default()
        };
        assert_eq!(entry.interval_minutes(), 5.0);
        assert_eq!(entry.instruction(), "new");
    }

    #[test]
    fn test_old_names_still_accepted() {
        let entry = AgentEntry {
            interval_minutes: Some(30.0),
            prompt: Some("old".into()),
            ..Default::default()
        };
        assert_eq!(entry.interval_minutes(), 30.0);
        assert_eq!(entry.instruction(), "old");
    }

    #[test]
    fn test_entry_defaults() {
        let entry = AgentEntry::default();
        assert_eq!(entry.interval_minutes(), DEFAULT_INTERVAL_MINUTES);
        assert_eq!(entry.instruction(), DEFAULT_INSTRUCTION);
    }

    #[test]
    fn test_agent_spec_name_defaults_to_id() {
        let spec = AgentSpec::new("agent-1", "", Duration::from_secs(60), "go");
        assert_eq!(spec.name, "agent-1");
        assert!(spec.enabled);
        assert!(!spec.disabled().enabled);
    }

    #[test]
    fn test_engine_spec_defaults() {
        let spec = EngineSpec::new("key", vec![]);
        assert_eq!(spec.timeout, Duration::from_secs(600));
        assert_eq!(spec.shutdown_grace, Duration::from_secs(1));
        assert_eq!(spec.base_url, "https://app.letta.com");
    }
}
