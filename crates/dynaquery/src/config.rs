use std::{env, time::Duration};

use dynaquery_core::batch::RetryPolicy;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Custom endpoint, e.g. local DynamoDB (default: none)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// Retries after the first attempt (default: 5)
    pub max_retries: usize,
    /// First backoff delay in milliseconds (default: 100)
    pub initial_backoff_ms: u64,
    /// Backoff ceiling in milliseconds (default: 2,000)
    pub max_backoff_ms: u64,
    /// Batch chunks in flight at once (default: 1)
    pub batch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `DYNAQUERY_MAX_RETRIES` - Retry budget (default: 5)
    /// - `DYNAQUERY_INITIAL_BACKOFF_MS` - First backoff delay (default: 100)
    /// - `DYNAQUERY_MAX_BACKOFF_MS` - Backoff ceiling (default: 2,000)
    /// - `DYNAQUERY_BATCH_CONCURRENCY` - Concurrent batch chunks (default: 1)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |name: &str| -> Option<u64> { lookup(name).and_then(|v| v.trim().parse().ok()) };

        Self {
            endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|v| !v.trim().is_empty()),
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            max_retries: parsed("DYNAQUERY_MAX_RETRIES").unwrap_or(5) as usize,
            initial_backoff_ms: parsed("DYNAQUERY_INITIAL_BACKOFF_MS").unwrap_or(100),
            max_backoff_ms: parsed("DYNAQUERY_MAX_BACKOFF_MS").unwrap_or(2_000),
            batch_concurrency: parsed("DYNAQUERY_BATCH_CONCURRENCY")
                .unwrap_or(1)
                .max(1) as usize,
        }
    }

    /// Retry policy shared by single-item calls and batch writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&[]));

        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 2_000);
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
            ("AWS_REGION", "eu-west-1"),
            ("DYNAQUERY_MAX_RETRIES", "2"),
            ("DYNAQUERY_BATCH_CONCURRENCY", "4"),
        ]));

        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.batch_concurrency, 4);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("AWS_ENDPOINT_URL", ""),
            ("DYNAQUERY_MAX_RETRIES", "many"),
            ("DYNAQUERY_BATCH_CONCURRENCY", "0"),
        ]));

        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn test_retry_policy_conversion() {
        let config = Config::from_lookup(lookup(&[
            ("DYNAQUERY_INITIAL_BACKOFF_MS", "50"),
            ("DYNAQUERY_MAX_BACKOFF_MS", "400"),
        ]));

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
        assert_eq!(policy.max_delay, Duration::from_millis(400));
    }
}
