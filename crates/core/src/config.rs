//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Nothing in this crate reads environment variables during request handling.

use crate::constants::{
    DEFAULT_ACTIVATION_TTL_HOURS, DEFAULT_FRONTEND_URL, DEFAULT_RESET_CODE_TTL_MINUTES,
    DEFAULT_TOKEN_TTL_MINUTES,
};
use crate::{TrackerError, TrackerResult};
use chrono::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    frontend_url: String,
    activation_ttl: Duration,
    reset_code_ttl: Duration,
    token_ttl: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if the frontend URL is blank or any lifetime is
    /// not strictly positive.
    pub fn new(
        frontend_url: impl Into<String>,
        activation_ttl: Duration,
        reset_code_ttl: Duration,
        token_ttl: Duration,
    ) -> TrackerResult<Self> {
        let frontend_url = frontend_url.into().trim().trim_end_matches('/').to_string();
        if frontend_url.is_empty() {
            return Err(TrackerError::InvalidInput(
                "frontend_url cannot be empty".into(),
            ));
        }

        for (name, ttl) in [
            ("activation_ttl", activation_ttl),
            ("reset_code_ttl", reset_code_ttl),
            ("token_ttl", token_ttl),
        ] {
            if ttl <= Duration::zero() {
                return Err(TrackerError::InvalidInput(format!(
                    "{name} must be positive"
                )));
            }
        }

        Ok(Self {
            frontend_url,
            activation_ttl,
            reset_code_ttl,
            token_ttl,
        })
    }

    /// Frontend base URL without a trailing slash.
    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn activation_ttl(&self) -> Duration {
        self.activation_ttl
    }

    pub fn reset_code_ttl(&self) -> Duration {
        self.reset_code_ttl
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Link a newly onboarded doctor follows to choose a password.
    pub fn activation_link(&self, token: &str) -> String {
        format!("{}/set-password?token={}", self.frontend_url, token)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            activation_ttl: Duration::hours(DEFAULT_ACTIVATION_TTL_HOURS),
            reset_code_ttl: Duration::minutes(DEFAULT_RESET_CODE_TTL_MINUTES),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }
}

/// Parse a frontend URL from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default local frontend.
pub fn frontend_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
}

/// Parse a token lifetime in minutes from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default lifetime.
pub fn token_ttl_from_env_value(value: Option<String>) -> TrackerResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let minutes = match value {
        Some(v) => v.parse::<i64>().map_err(|e| {
            TrackerError::InvalidInput(format!("invalid token lifetime '{v}': {e}"))
        })?,
        None => DEFAULT_TOKEN_TTL_MINUTES,
    };

    if minutes <= 0 {
        return Err(TrackerError::InvalidInput(
            "token lifetime must be positive".into(),
        ));
    }

    Ok(Duration::minutes(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let cfg = CoreConfig::new(
            "https://ward.example.org/",
            Duration::hours(24),
            Duration::minutes(15),
            Duration::minutes(60),
        )
        .unwrap();

        assert_eq!(
            cfg.activation_link("abc"),
            "https://ward.example.org/set-password?token=abc"
        );
    }

    #[test]
    fn test_new_rejects_blank_url_and_zero_ttl() {
        assert!(CoreConfig::new(
            "  ",
            Duration::hours(1),
            Duration::hours(1),
            Duration::hours(1)
        )
        .is_err());
        assert!(CoreConfig::new(
            "http://x",
            Duration::zero(),
            Duration::hours(1),
            Duration::hours(1)
        )
        .is_err());
    }

    #[test]
    fn test_token_ttl_from_env_value() {
        assert_eq!(
            token_ttl_from_env_value(None).unwrap(),
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES)
        );
        assert_eq!(
            token_ttl_from_env_value(Some(" 30 ".into())).unwrap(),
            Duration::minutes(30)
        );
        assert!(token_ttl_from_env_value(Some("soon".into())).is_err());
        assert!(token_ttl_from_env_value(Some("-5".into())).is_err());
    }

    #[test]
    fn test_frontend_url_default() {
        assert_eq!(frontend_url_from_env_value(Some("".into())), DEFAULT_FRONTEND_URL);
    }
}
