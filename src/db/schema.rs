pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS agent_activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL,
    agent_name TEXT NOT NULL,
    cycle_number INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    response_text TEXT,
    tool_calls TEXT,
    stop_reason TEXT,
    usage_tokens INTEGER,
    usage_input_tokens INTEGER,
    usage_output_tokens INTEGER,
    status TEXT NOT NULL DEFAULT 'success',
    error_message TEXT,
    duration_ms INTEGER,
    extra_metadata TEXT
);

CREATE INDEX IF NOT EXISTS idx_activities_agent ON agent_activities(agent_id);
CREATE INDEX IF NOT EXISTS idx_agent_timestamp ON agent_activities(agent_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_timestamp ON agent_activities(timestamp);
";
