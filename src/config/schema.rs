use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "letta": {
                "type": "object",
                "properties": {
                    "api_key": { "type": ["string", "null"] },
                    "base_url": { "type": ["string", "null"] },
                    "timeout": { "type": "integer", "minimum": 1 }
                }
            },
            "engine": {
                "type": "object",
                "properties": {
                    "shutdown_grace_secs": { "type": "number", "minimum": 0 }
                }
            },
            "storage": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "database_path": { "type": "string" }
                }
            },
            "agents": {
                "type": ["array", "null"],
                "items": { "$ref": "#/$defs/agent" }
            }
        },
        "$defs": {
            "agent": {
                "type": "object",
                "required": ["agent_id"],
                "properties": {
                    "name": { "type": ["string", "number", "null"] },
                    "agent_id": { "type": ["string", "number", "null"] },
                    "cycle_interval_minutes": { "type": "number", "exclusiveMinimum": 0 },
                    "interval_minutes": { "type": "number", "exclusiveMinimum": 0 },
                    "activation_instruction": { "type": "string" },
                    "prompt": { "type": "string" },
                    "enabled": { "type": "boolean" }
                }
            }
        }
    })
});

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(doc: Value) -> bool {
        let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA).unwrap();
        compiled.is_valid(&doc)
    }

    #[test]
    fn test_schema_accepts_typical_config() {
        assert!(is_valid(json!({
            "letta": {"api_key": "k", "timeout": 600},
            "agents": [{"name": "A", "agent_id": "a", "cycle_interval_minutes": 15}]
        })));
    }

    #[test]
    fn test_schema_flags_missing_agent_id() {
        assert!(!is_valid(json!({"agents": [{"name": "A"}]})));
    }

    #[test]
    fn test_schema_flags_non_positive_interval() {
        assert!(!is_valid(json!({"agents": [{"agent_id": "a", "interval_minutes": 0}]})));
    }
}
