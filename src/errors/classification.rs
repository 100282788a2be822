use super::types::EngineError;
use crate::engine::state::CycleStatus;

/// Message fragments the Letta service and upstream LLM providers use when
/// they throttle a request. Matched case-insensitively.
const THROTTLE_MARKERS: &[&str] = &[
    "429",
    "rate_limit",
    "rate limit",
    "quota",
    "too many requests",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub cycle_status: CycleStatus,
}

/// Map a normalized failure (optional HTTP status plus message text) to the
/// status recorded for the cycle. Only throttling is treated as recoverable;
/// everything else counts as an error.
///
/// Message matching depends on the wording the remote service uses, so a
/// change on their side can silently turn throttling into counted errors.
pub fn classify_failure(status: Option<u16>, message: &str) -> CycleStatus {
    if status == Some(429) {
        return CycleStatus::RateLimited;
    }
    let lower = message.to_lowercase();
    if THROTTLE_MARKERS.iter().any(|m| lower.contains(m)) {
        CycleStatus::RateLimited
    } else {
        CycleStatus::Error
    }
}

impl EngineError {
    /// Classify this error to determine how the failed cycle is counted.
    pub fn classify(&self) -> ErrorClassification {
        let cycle_status = match self {
            // Transport text can embed the request URL and with it the agent id
            EngineError::Network(_) | EngineError::Timeout(_) => CycleStatus::Error,
            _ => classify_failure(self.status_code(), &self.to_string()),
        };
        let error_type = match self {
            EngineError::RateLimit(_) => "RateLimitError",
            EngineError::Service { .. } if cycle_status == CycleStatus::RateLimited => "RateLimitError",
            EngineError::Service { .. } => "ServiceError",
            EngineError::Authentication(_) => "AuthenticationError",
            EngineError::Network(_) => "NetworkError",
            EngineError::Timeout(_) => "TimeoutError",
            EngineError::Config(_) => "ConfigError",
            EngineError::Database(_) => "DatabaseError",
            EngineError::Io(_) => "IoError",
            EngineError::Json(_) => "JsonError",
            EngineError::Yaml(_) => "YamlError",
            EngineError::Internal(_) => "InternalError",
        };
        ErrorClassification { error_type, cycle_status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_429_is_rate_limited() {
        assert_eq!(classify_failure(Some(429), "anything"), CycleStatus::RateLimited);
    }

    #[test]
    fn test_message_markers_are_rate_limited() {
        assert_eq!(classify_failure(None, "429 rate limit"), CycleStatus::RateLimited);
        assert_eq!(classify_failure(None, "Rate_Limit exceeded for model"), CycleStatus::RateLimited);
        assert_eq!(classify_failure(None, "You exceeded your current QUOTA"), CycleStatus::RateLimited);
        assert_eq!(classify_failure(Some(500), "Too Many Requests upstream"), CycleStatus::RateLimited);
    }

    #[test]
    fn test_other_failures_are_errors() {
        assert_eq!(classify_failure(None, "connection refused"), CycleStatus::Error);
        assert_eq!(classify_failure(Some(500), "internal server error"), CycleStatus::Error);
        assert_eq!(classify_failure(Some(404), "agent not found"), CycleStatus::Error);
    }

    #[test]
    fn test_rate_limit_variant_classification() {
        let class = EngineError::RateLimit("slow down".into()).classify();
        assert_eq!(class.cycle_status, CycleStatus::RateLimited);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_service_error_with_quota_message() {
        let err = EngineError::Service {
            status: Some(400),
            message: "insufficient_quota".into(),
        };
        let class = err.classify();
        assert_eq!(class.cycle_status, CycleStatus::RateLimited);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_network_error_classification() {
        let class = EngineError::Network("connection refused".into()).classify();
        assert_eq!(class.cycle_status, CycleStatus::Error);
        assert_eq!(class.error_type, "NetworkError");
    }

    #[test]
    fn test_network_error_mentioning_429_in_agent_id() {
        let err = EngineError::Network(
            "Letta request failed: error sending request for url (https://app.letta.com/v1/agents/agent-5f429a/messages): connection refused".into(),
        );
        let class = err.classify();
        assert_eq!(class.cycle_status, CycleStatus::Error);
        assert_eq!(class.error_type, "NetworkError");
    }

    #[test]
    fn test_timeout_classification() {
        let class = EngineError::Timeout("request timed out after 600s".into()).classify();
        assert_eq!(class.cycle_status, CycleStatus::Error);
        assert_eq!(class.error_type, "TimeoutError");
    }

    #[test]
    fn test_auth_classification() {
        let class = EngineError::Authentication("invalid token".into()).classify();
        assert_eq!(class.cycle_status, CycleStatus::Error);
        assert_eq!(class.error_type, "AuthenticationError");
    }
}
