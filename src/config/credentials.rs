use tracing::debug;

/// Resolve a config value. A leading '$' names an environment variable;
/// if it is unset the literal is kept so the caller can report it.
pub fn resolve_credential(value: &str) -> String {
    match value.strip_prefix('$') {
        Some(var_name) => match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved config value from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        },
        None => value.to_string(),
    }
}

/// Replace every occurrence of the given secrets with [REDACTED]. Secrets
/// shorter than four characters are left alone to avoid shredding text.
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}

/// Short form of a key for console output: first and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credential_literal() {
        assert_eq!(resolve_credential("sk-literal"), "sk-literal");
    }

    #[test]
    fn test_resolve_credential_env_var() {
        std::env::set_var("TEST_CADENCE_CRED", "secret123");
        assert_eq!(resolve_credential("$TEST_CADENCE_CRED"), "secret123");
        std::env::remove_var("TEST_CADENCE_CRED");
    }

    #[test]
    fn test_resolve_credential_missing_env_var() {
        assert_eq!(resolve_credential("$NONEXISTENT_CADENCE_VAR"), "$NONEXISTENT_CADENCE_VAR");
    }

    #[test]
    fn test_redact_credentials() {
        let redacted = redact_credentials("Bearer sk-live-1234 rejected", &["sk-live-1234"]);
        assert_eq!(redacted, "Bearer [REDACTED] rejected");
    }

    #[test]
    fn test_redact_credentials_short_secret_ignored() {
        assert_eq!(redact_credentials("key=ab", &["ab"]), "key=ab");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-abcdefghijkl"), "sk-a…ijkl");
        assert_eq!(mask_secret("short"), "*****");
    }
}
