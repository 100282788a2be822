use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Service error ({}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "no status".into()))]
    Service {
        status: Option<u16>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// HTTP status attached to the failure, when the remote service returned one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            EngineError::RateLimit(_) => Some(429),
            EngineError::Service { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display_with_status() {
        let err = EngineError::Service { status: Some(502), message: "bad gateway".into() };
        assert_eq!(err.to_string(), "Service error (502): bad gateway");
    }

    #[test]
    fn test_service_error_display_without_status() {
        let err = EngineError::Service { status: None, message: "stream closed".into() };
        assert_eq!(err.to_string(), "Service error (no status): stream closed");
    }

    #[test]
    fn test_status_code() {
        assert_eq!(EngineError::RateLimit("slow down".into()).status_code(), Some(429));
        assert_eq!(EngineError::Network("refused".into()).status_code(), None);
    }
}
