use std::time::Duration;

use crate::breaker::CircuitBreakerConfig;

pub const MISTRAL_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";
pub const PERPLEXITY_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

/// LunaBug provider configuration.
///
/// A provider without an API key is not registered.
#[derive(Debug, Clone)]
pub struct LunaBugConfig {
    pub mistral_api_key: Option<String>,
    /// Separate key used for debug-mode requests, when set.
    pub mistral_debug_api_key: Option<String>,
    pub mistral_model: String,
    pub perplexity_api_key: Option<String>,
    pub perplexity_model: String,
    /// Per-request timeout for provider calls.
    pub timeout: Duration,
    /// Total time all providers together may take before the local
    /// responder answers.
    pub budget: Duration,
    pub breaker: CircuitBreakerConfig,
}

impl Default for LunaBugConfig {
    fn default() -> Self {
        Self {
            mistral_api_key: None,
            mistral_debug_api_key: None,
            mistral_model: "mistral-small-latest".into(),
            perplexity_api_key: None,
            perplexity_model: "sonar".into(),
            timeout: Duration::from_secs(30),
            budget: Duration::from_secs(20),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl LunaBugConfig {
    /// Load from environment variables.
    ///
    /// | Env Var                     | Default                |
    /// |-----------------------------|------------------------|
    /// | `MISTRAL_API_KEY`           | unset (provider off)   |
    /// | `MISTRAL_DEBUG_API_KEY`     | unset                  |
    /// | `MISTRAL_MODEL`             | `mistral-small-latest` |
    /// | `PERPLEXITY_API_KEY`        | unset (provider off)   |
    /// | `PERPLEXITY_MODEL`          | `sonar`                |
    /// | `LUNABUG_TIMEOUT_SECS`      | `30`                   |
    /// | `LUNABUG_BUDGET_SECS`       | `20`                   |
    /// | `LUNABUG_FAILURE_THRESHOLD` | `3`                    |
    /// | `LUNABUG_COOLDOWN_SECS`     | `60`                   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_secs: u64 = std::env::var("LUNABUG_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("LUNABUG_TIMEOUT_SECS must be a valid u64");

        let budget_secs: u64 = std::env::var("LUNABUG_BUDGET_SECS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("LUNABUG_BUDGET_SECS must be a valid u64");

        let failure_threshold: u32 = std::env::var("LUNABUG_FAILURE_THRESHOLD")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("LUNABUG_FAILURE_THRESHOLD must be a valid u32");

        let cooldown_secs: u64 = std::env::var("LUNABUG_COOLDOWN_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("LUNABUG_COOLDOWN_SECS must be a valid u64");

        Self {
            mistral_api_key: non_empty_env("MISTRAL_API_KEY"),
            mistral_debug_api_key: non_empty_env("MISTRAL_DEBUG_API_KEY"),
            mistral_model: std::env::var("MISTRAL_MODEL").unwrap_or(defaults.mistral_model),
            perplexity_api_key: non_empty_env("PERPLEXITY_API_KEY"),
            perplexity_model: std::env::var("PERPLEXITY_MODEL").unwrap_or(defaults.perplexity_model),
            timeout: Duration::from_secs(timeout_secs),
            budget: Duration::from_secs(budget_secs),
            breaker: CircuitBreakerConfig {
                failure_threshold: failure_threshold.max(1),
                cooldown: Duration::from_secs(cooldown_secs),
            },
        }
    }

    /// Cap the provider budget at four fifths of the HTTP request timeout so
    /// a slow provider still leaves time for the local answer.
    pub fn within_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.budget = self.budget.min(request_timeout * 4 / 5);
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_stays_below_request_timeout() {
        let config = LunaBugConfig::default().within_request_timeout(Duration::from_secs(10));
        assert_eq!(config.budget, Duration::from_secs(8));

        let roomy = LunaBugConfig::default().within_request_timeout(Duration::from_secs(120));
        assert_eq!(roomy.budget, Duration::from_secs(20));
    }
}
