use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use crate::engine::{ActivityRecord, ActivityRecorder};
use crate::errors::EngineError;
use super::Database;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Filters for listing activities. `None` fields do not filter.
#[derive(Debug, Clone)]
pub struct ActivityQuery {
    pub agent_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            agent_id: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            start: None,
            end: None,
        }
    }
}

/// Fixed-width UTC timestamps so text comparison matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_json_column(raw: Option<String>) -> Value {
    raw.and_then(|s| serde_json::from_str(&s).ok()).unwrap_or(Value::Null)
}

impl Database {
    pub fn store_activity(&self, record: &ActivityRecord) -> Result<i64, EngineError> {
        self.store_activity_at(record, Utc::now())
    }

    pub fn store_activity_at(
        &self,
        record: &ActivityRecord,
        at: DateTime<Utc>,
    ) -> Result<i64, EngineError> {
        let response = record.outcome.response.as_ref();
        let tool_calls = match response {
            Some(r) if !r.tool_calls.is_empty() => Some(serde_json::to_string(&r.tool_calls)?),
            _ => None,
        };
        let usage = response.and_then(|r| r.usage.as_ref());
        let metadata = serde_json::to_string(&record.metadata)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO agent_activities (agent_id, agent_name, cycle_number, timestamp, response_text, tool_calls, stop_reason, usage_tokens, usage_input_tokens, usage_output_tokens, status, error_message, duration_ms, extra_metadata) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            rusqlite::params![
                record.agent_id,
                record.agent_name,
                record.cycle_number as i64,
                format_timestamp(at),
                response.and_then(|r| r.text.as_deref()),
                tool_calls,
                response.and_then(|r| r.stop_reason.as_deref()),
                usage.and_then(|u| u.total_tokens).map(|v| v as i64),
                usage.and_then(|u| u.input_tokens).map(|v| v as i64),
                usage.and_then(|u| u.output_tokens).map(|v| v as i64),
                record.outcome.status.as_str(),
                record.outcome.error,
                record.outcome.duration_ms as i64,
                metadata,
            ],
        ).map_err(|e| EngineError::Database(format!("Failed to store activity: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest first.
    pub fn get_activities(&self, query: &ActivityQuery) -> Result<Vec<Value>, EngineError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, agent_name, cycle_number, timestamp, response_text, tool_calls, stop_reason, usage_tokens, usage_input_tokens, usage_output_tokens, status, error_message, duration_ms, extra_metadata FROM agent_activities WHERE (?1 IS NULL OR agent_id = ?1) AND (?2 IS NULL OR timestamp >= ?2) AND (?3 IS NULL OR timestamp <= ?3) ORDER BY timestamp DESC, id DESC LIMIT ?4 OFFSET ?5"
        ).map_err(|e| EngineError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(
            rusqlite::params![
                query.agent_id,
                query.start.map(format_timestamp),
                query.end.map(format_timestamp),
                query.limit as i64,
                query.offset as i64,
            ],
            |row: &rusqlite::Row| {
                Ok(json!({
                    "id": row.get::<_, i64>(0)?,
                    "agent_id": row.get::<_, String>(1)?,
                    "agent_name": row.get::<_, String>(2)?,
                    "cycle_number": row.get::<_, i64>(3)?,
                    "timestamp": row.get::<_, String>(4)?,
                    "response_text": row.get::<_, Option<String>>(5)?,
                    "tool_calls": parse_json_column(row.get::<_, Option<String>>(6)?),
                    "stop_reason": row.get::<_, Option<String>>(7)?,
                    "usage": {
                        "tokens": row.get::<_, Option<i64>>(8)?,
                        "input_tokens": row.get::<_, Option<i64>>(9)?,
                        "output_tokens": row.get::<_, Option<i64>>(10)?,
                    },
                    "status": row.get::<_, String>(11)?,
                    "error_message": row.get::<_, Option<String>>(12)?,
                    "duration_ms": row.get::<_, Option<i64>>(13)?,
                    "metadata": parse_json_column(row.get::<_, Option<String>>(14)?),
                }))
            },
        ).map_err(|e| EngineError::Database(format!("Query error: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| EngineError::Database(format!("Row error: {}", e)))?);
        }
        Ok(results)
    }

    /// Every agent that has recorded at least one cycle, most recently active first.
    pub fn get_agents(&self) -> Result<Vec<Value>, EngineError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT a.agent_id, (SELECT agent_name FROM agent_activities b WHERE b.agent_id = a.agent_id ORDER BY timestamp DESC, id DESC LIMIT 1), MAX(a.timestamp), COUNT(*) FROM agent_activities a GROUP BY a.agent_id ORDER BY MAX(a.timestamp) DESC"
        ).map_err(|e| EngineError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map([], |row: &rusqlite::Row| {
            Ok(json!({
                "agent_id": row.get::<_, String>(0)?,
                "agent_name": row.get::<_, String>(1)?,
                "last_activity": row.get::<_, Option<String>>(2)?,
                "total_cycles": row.get::<_, i64>(3)?,
            }))
        }).map_err(|e| EngineError::Database(format!("Query error: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| EngineError::Database(format!("Row error: {}", e)))?);
        }
        Ok(results)
    }

    /// Counts and token usage for one agent over the last `days` days.
    pub fn get_agent_stats(&self, agent_id: &str, days: u32) -> Result<Value, EngineError> {
        let since = format_timestamp(Utc::now() - Duration::days(i64::from(days)));
        let conn = self.lock()?;

        type Counts = (i64, i64, i64, i64, i64, i64);
        let (total, success, errors, rate_limited, tool_calls, tokens): Counts = conn.query_row(
            "SELECT COUNT(*), \
                COALESCE(SUM(status = 'success'), 0), \
                COALESCE(SUM(status = 'error'), 0), \
                COALESCE(SUM(status = 'rate_limit'), 0), \
                COALESCE(SUM(CASE WHEN json_valid(tool_calls) THEN json_array_length(tool_calls) ELSE 0 END), 0), \
                COALESCE(SUM(usage_tokens), 0) \
             FROM agent_activities WHERE agent_id = ?1 AND timestamp >= ?2",
            rusqlite::params![agent_id, since],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
        ).map_err(|e| EngineError::Database(format!("Query error: {}", e)))?;

        let agent_name: Option<String> = match conn.query_row(
            "SELECT agent_name FROM agent_activities WHERE agent_id = ?1 AND timestamp >= ?2 ORDER BY timestamp DESC, id DESC LIMIT 1",
            rusqlite::params![agent_id, since],
            |row| row.get(0),
        ) {
            Ok(name) => Some(name),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(EngineError::Database(format!("Query error: {}", e))),
        };

        let avg_tokens = if total > 0 {
            (tokens as f64 / total as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(json!({
            "agent_id": agent_id,
            "agent_name": agent_name,
            "total_cycles": total,
            "successful_cycles": success,
            "error_cycles": errors,
            "rate_limit_cycles": rate_limited,
            "total_tool_calls": tool_calls,
            "total_tokens": tokens,
            "avg_tokens_per_cycle": avg_tokens,
            "period_days": days,
        }))
    }
}

#[async_trait]
impl ActivityRecorder for Database {
    async fn record(&self, record: &ActivityRecord) -> Result<i64, EngineError> {
        let db = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || db.store_activity(&record))
            .await
            .map_err(|e| EngineError::Internal(format!("Storage task failed: {}", e)))?
    }
}
