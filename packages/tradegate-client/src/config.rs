//! Backend connection settings.

use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the analysis backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Read `TRADEGATE_API_URL` and `TRADEGATE_API_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_values(
            env::var("TRADEGATE_API_URL").ok(),
            env::var("TRADEGATE_API_TIMEOUT_SECS").ok(),
        )
    }

    fn from_values(base_url: Option<String>, timeout: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match timeout {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(value = %raw, "Ignoring invalid API timeout");
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            base_url,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_values(None, None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::from_values(Some("https://example.test/api/".to_string()), None);
        assert_eq!(config.base_url, "https://example.test/api");
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = ClientConfig::from_values(None, Some("soon".to_string()));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let zero = ClientConfig::from_values(None, Some("0".to_string()));
        assert_eq!(zero.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let custom = ClientConfig::from_values(None, Some(" 5 ".to_string()));
        assert_eq!(custom.timeout_secs, 5);
    }
}
