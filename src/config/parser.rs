use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use crate::errors::EngineError;
use super::credentials::resolve_credential;
use super::schema::CONFIG_SCHEMA;
use super::types::*;
use tracing::warn;

/// Everything a config file resolves to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub engine: EngineSpec,
    pub storage: StorageSpec,
}

pub async fn parse_config(path: &Path) -> Result<LoadedConfig, EngineError> {
    if !path.exists() {
        return Err(EngineError::Config(format!(
            "Config file not found: {} (copy config.yaml.template or run `cadence generate-config`)",
            path.display()
        )));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(EngineError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content, &|name| std::env::var(name).ok())
}

/// Parse config text, reading fallbacks through `env`.
pub fn parse_config_str(
    content: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<LoadedConfig, EngineError> {
    // An empty document is an empty config, not an error
    let mut yaml: serde_yaml::Value = match serde_yaml::from_str(content)? {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
        other => other,
    };
    // `agents:` with nothing under it means no agents
    if let serde_yaml::Value::Mapping(map) = &mut yaml {
        if map.get("agents").is_some_and(serde_yaml::Value::is_null) {
            map.remove("agents");
        }
    }

    validate_schema(&yaml)?;

    let file: EngineConfigFile = serde_yaml::from_value(yaml)?;
    build_config(file, env)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), EngineError> {
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| EngineError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| EngineError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| EngineError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        // Advisory only: typed parsing below is the real gate
        for e in errors {
            let msg = format!("{} at {}", e, e.instance_path);
            warn!(validation_error = %msg, "Config schema warning");
        }
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn build_config(
    file: EngineConfigFile,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<LoadedConfig, EngineError> {
    let letta = file.letta.unwrap_or_default();

    let api_key = non_empty(letta.api_key.as_deref().map(resolve_credential))
        .or_else(|| non_empty(env("LETTA_API_KEY")))
        .ok_or_else(|| EngineError::Config(
            "Letta API key required (set letta.api_key in the config or LETTA_API_KEY)".into()
        ))?;

    let base_url = non_empty(letta.base_url.as_deref().map(resolve_credential))
        .or_else(|| non_empty(env("LETTA_BASE_URL")))
        .unwrap_or_else(|| crate::client::letta::DEFAULT_BASE_URL.to_string());

    let timeout = match letta.timeout {
        Some(0) => {
            return Err(EngineError::Config("letta.timeout must be greater than zero".into()));
        }
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    };

    let grace_secs = file
        .engine
        .and_then(|e| e.shutdown_grace_secs)
        .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS);
    if !grace_secs.is_finite() || grace_secs < 0.0 {
        return Err(EngineError::Config(
            "engine.shutdown_grace_secs must be zero or positive".into(),
        ));
    }
    let shutdown_grace = Duration::try_from_secs_f64(grace_secs).map_err(|_| {
        EngineError::Config(format!("engine.shutdown_grace_secs is out of range: {}", grace_secs))
    })?;

    let agents = dedupe_agents(file.agents.iter().filter_map(agent_from_entry).collect());

    let storage_section = file.storage.unwrap_or_default();
    let storage = StorageSpec {
        enabled: storage_section
            .enabled
            .or_else(|| env("ENABLE_ACTIVITY_STORAGE").map(|v| v.eq_ignore_ascii_case("true")))
            .unwrap_or(true),
        database_path: non_empty(storage_section.database_path)
            .or_else(|| non_empty(env("DATABASE_PATH")))
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
    };

    Ok(LoadedConfig {
        engine: EngineSpec {
            base_url,
            api_key,
            timeout,
            shutdown_grace,
            agents,
        },
        storage,
    })
}

/// Validate one agent entry. Problems drop the agent with a warning instead
/// of failing the whole load.
fn agent_from_entry(entry: &AgentEntry) -> Option<AgentSpec> {
    let id = entry.agent_id.trim();
    if id.is_empty() {
        warn!(agent = %entry.name, "Agent missing agent_id, skipping");
        return None;
    }

    let minutes = entry.interval_minutes();
    if !minutes.is_finite() || minutes <= 0.0 {
        warn!(
            agent = %entry.name,
            agent_id = %id,
            minutes,
            "Agent cycle interval must be positive, skipping"
        );
        return None;
    }

    let Ok(interval) = Duration::try_from_secs_f64(minutes * 60.0) else {
        warn!(
            agent = %entry.name,
            agent_id = %id,
            minutes,
            "Agent cycle interval is out of range, skipping"
        );
        return None;
    };

    let mut spec = AgentSpec::new(id, entry.name.trim(), interval, &entry.instruction());
    spec.enabled = entry.enabled.unwrap_or(true);
    Some(spec)
}

/// Later entries with the same id replace earlier ones. The surviving entry
/// sits at the position of its last occurrence.
fn dedupe_agents(agents: Vec<AgentSpec>) -> Vec<AgentSpec> {
    let mut last_index: HashMap<String, usize> = HashMap::new();
    for (i, agent) in agents.iter().enumerate() {
        if let Some(prev) = last_index.insert(agent.id.clone(), i) {
            warn!(
                agent_id = %agent.id,
                replaced = %agents[prev].name,
                by = %agent.name,
                "Duplicate agent_id in config, last entry wins"
            );
        }
    }

    agents
        .into_iter()
        .enumerate()
        .filter(|(i, a)| last_index.get(&a.id) == Some(i))
        .map(|(_, a)| a)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
letta:
  api_key: test-api-key
  base_url: https://test-letta.com
  timeout: 120
engine:
  shutdown_grace_secs: 2.5
storage:
  enabled: false
  database_path: /tmp/acts.db
agents:
  - name: Test Agent
    agent_id: test-agent-id
    cycle_interval_minutes: 10
    activation_instruction: Review your goals.
"#;
        let loaded = parse_config_str(yaml, &no_env).unwrap();
        let engine = loaded.engine;
        assert_eq!(engine.api_key, "test-api-key");
        assert_eq!(engine.base_url, "https://test-letta.com");
        assert_eq!(engine.timeout, Duration::from_secs(120));
        assert_eq!(engine.shutdown_grace, Duration::from_millis(2500));
        assert_eq!(engine.agents.len(), 1);
        assert_eq!(engine.agents[0].name, "Test Agent");
        assert_eq!(engine.agents[0].id, "test-agent-id");
        assert_eq!(engine.agents[0].interval, Duration::from_secs(600));
        assert_eq!(engine.agents[0].instruction, "Review your goals.");
        assert!(engine.agents[0].enabled);
        assert!(!loaded.storage.enabled);
        assert_eq!(loaded.storage.database_path, "/tmp/acts.db");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let yaml = "letta:\n  base_url: https://test.com\nagents: []\n";
        let err = parse_config_str(yaml, &no_env).unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.contains("Letta API key required")));
    }

    #[test]
    fn test_env_fallbacks() {
        let env = |name: &str| match name {
            "LETTA_API_KEY" => Some("env-api-key".to_string()),
            "LETTA_BASE_URL" => Some("https://env-server.com".to_string()),
            "DATABASE_PATH" => Some("/var/lib/cadence.db".to_string()),
            _ => None,
        };
        let yaml = "letta:\n  api_key: ''\n  base_url: ''\nagents: []\n";
        let loaded = parse_config_str(yaml, &env).unwrap();
        assert_eq!(loaded.engine.api_key, "env-api-key");
        assert_eq!(loaded.engine.base_url, "https://env-server.com");
        assert_eq!(loaded.storage.database_path, "/var/lib/cadence.db");
        assert!(loaded.storage.enabled);
    }

    #[test]
    fn test_storage_disabled_by_env() {
        let env = |name: &str| match name {
            "LETTA_API_KEY" => Some("k".to_string()),
            "ENABLE_ACTIVITY_STORAGE" => Some("false".to_string()),
            _ => None,
        };
        let loaded = parse_config_str("agents: []", &env).unwrap();
        assert!(!loaded.storage.enabled);
    }

    #[test]
    fn test_backward_compat_field_names() {
        let yaml = r#"
letta: {api_key: k}
agents:
  - name: Test
    agent_id: test-id
    interval_minutes: 30
    prompt: Test prompt
"#;
        let loaded = parse_config_str(yaml, &no_env).unwrap();
        let agent = &loaded.engine.agents[0];
        assert_eq!(agent.interval, Duration::from_secs(30 * 60));
        assert_eq!(agent.instruction, "Test prompt");
    }

    #[test]
    fn test_agents_without_id_or_with_bad_interval_are_dropped() {
        let yaml = r#"
letta: {api_key: k}
agents:
  - name: No Id
  - name: Zero
    agent_id: zero
    cycle_interval_minutes: 0
  - name: Good
    agent_id: good
    enabled: false
"#;
        let loaded = parse_config_str(yaml, &no_env).unwrap();
        assert_eq!(loaded.engine.agents.len(), 1);
        assert_eq!(loaded.engine.agents[0].id, "good");
        assert!(!loaded.engine.agents[0].enabled);
    }

    #[test]
    fn test_blank_or_numeric_agent_ids() {
        let yaml = r#"
letta: {api_key: k}
agents:
  - name: Blank
    agent_id:
  - name: Numeric
    agent_id: 12345
  - name: Good
    agent_id: good
"#;
        let loaded = parse_config_str(yaml, &no_env).unwrap();
        let ids: Vec<&str> = loaded.engine.agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["12345", "good"]);
        assert_eq!(loaded.engine.agents[0].name, "Numeric");
    }

    #[test]
    fn test_agent_with_huge_interval_is_dropped() {
        let yaml = r#"
letta: {api_key: k}
agents:
  - {name: Forever, agent_id: forever, cycle_interval_minutes: 1.0e300}
  - {name: Good, agent_id: good}
"#;
        let loaded = parse_config_str(yaml, &no_env).unwrap();
        assert_eq!(loaded.engine.agents.len(), 1);
        assert_eq!(loaded.engine.agents[0].id, "good");
    }

    #[test]
    fn test_huge_shutdown_grace_rejected() {
        let yaml = "letta: {api_key: k}\nengine: {shutdown_grace_secs: 1.0e30}\n";
        let err = parse_config_str(yaml, &no_env).unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.contains("out of range")));
    }

    #[test]
    fn test_duplicate_ids_last_wins() {
        let yaml = r#"
letta: {api_key: k}
agents:
  - {name: First, agent_id: dup}
  - {name: Other, agent_id: other}
  - {name: Second, agent_id: dup}
"#;
        let loaded = parse_config_str(yaml, &no_env).unwrap();
        let names: Vec<&str> = loaded.engine.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Other", "Second"]);
    }

    #[test]
    fn test_empty_agents_key() {
        let loaded = parse_config_str("letta: {api_key: k}\nagents:\n", &no_env).unwrap();
        assert!(loaded.engine.agents.is_empty());
    }

    #[test]
    fn test_zero_agents_is_valid() {
        let loaded = parse_config_str("letta: {api_key: k}", &no_env).unwrap();
        assert!(loaded.engine.agents.is_empty());
    }

    #[test]
    fn test_empty_document_needs_key_from_env() {
        assert!(parse_config_str("", &no_env).is_err());
        let env = |n: &str| (n == "LETTA_API_KEY").then(|| "k".to_string());
        assert!(parse_config_str("", &env).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let yaml = "letta: {api_key: k, timeout: 0}";
        assert!(parse_config_str(yaml, &no_env).is_err());
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = parse_config_str("letta: [unclosed", &no_env).unwrap_err();
        assert!(matches!(err, EngineError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = parse_config(Path::new("nonexistent_config.yaml")).await.unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn test_parse_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "letta: {api_key: file-key}\nagents:\n  - {name: A, agent_id: a}\n").unwrap();
        let loaded = parse_config(&path).await.unwrap();
        assert_eq!(loaded.engine.api_key, "file-key");
        assert_eq!(loaded.engine.agents[0].interval, Duration::from_secs(15 * 60));
    }
}
