//! Provider failover.
//!
//! Providers are tried in registration order. A provider whose breaker is
//! open is skipped without a request. All provider calls share one time
//! budget; each gets an even share of what is left. When every provider is
//! skipped, fails or runs out of time, the local responder answers.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::breaker::{BreakerStatus, CircuitBreaker, CircuitBreakerConfig};
use crate::config::LunaBugConfig;
use crate::fallback;
use crate::prompts::{build_messages, LunaBugRequest, Mode};
use crate::provider::{LlmProvider, OpenAiCompatibleProvider, ProviderError};

pub const LOCAL_PROVIDER: &str = "local";

/// Provider budget used when none is configured.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LunaBugResponse {
    pub response: String,
    pub provider: String,
    pub model: Option<String>,
    pub mode: Mode,
    /// `true` when the local responder produced the answer.
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    #[serde(flatten)]
    pub breaker: BreakerStatus,
}

struct ProviderSlot {
    provider: Arc<dyn LlmProvider>,
    breaker: Mutex<CircuitBreaker>,
}

impl ProviderSlot {
    // The breaker lock is never held across an await.
    fn with_breaker<R>(&self, f: impl FnOnce(&mut CircuitBreaker) -> R) -> R {
        let mut guard = self.breaker.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

/// Hands a claimed half-open trial back if the call is dropped (request
/// timeout, client gone) before it records an outcome.
struct TrialGuard<'a> {
    slot: &'a ProviderSlot,
    armed: bool,
}

impl<'a> TrialGuard<'a> {
    fn new(slot: &'a ProviderSlot) -> Self {
        Self { slot, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slot.with_breaker(|b| b.release_trial());
        }
    }
}

pub struct LunaBug {
    providers: Vec<ProviderSlot>,
    budget: Duration,
}

impl LunaBug {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, breaker: CircuitBreakerConfig) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| ProviderSlot {
                provider,
                breaker: Mutex::new(CircuitBreaker::with_config(breaker.clone())),
            })
            .collect();
        Self {
            providers,
            budget: DEFAULT_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Mistral then Perplexity, each only if its key is configured.
    pub fn from_config(config: &LunaBugConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        if let Some(mistral) = OpenAiCompatibleProvider::mistral(config, client.clone()) {
            providers.push(Arc::new(mistral));
        }
        if let Some(perplexity) = OpenAiCompatibleProvider::perplexity(config, client) {
            providers.push(Arc::new(perplexity));
        }
        if providers.is_empty() {
            tracing::warn!("No LunaBug providers configured, answering from local fallback only");
        }
        Ok(Self::new(providers, config.breaker.clone()).with_budget(config.budget))
    }

    pub async fn respond(&self, mode: Mode, request: &LunaBugRequest) -> LunaBugResponse {
        let messages = build_messages(mode, request);
        let deadline = tokio::time::Instant::now() + self.budget;

        for (index, slot) in self.providers.iter().enumerate() {
            let name = slot.provider.name();
            let now = tokio::time::Instant::now();
            if now >= deadline {
                tracing::warn!(provider = name, %mode, "LunaBug provider budget spent");
                break;
            }
            if !slot.with_breaker(|b| b.try_acquire()) {
                tracing::debug!(provider = name, "Circuit open, skipping provider");
                continue;
            }

            let remaining_providers = (self.providers.len() - index) as u32;
            let call_deadline = now + (deadline - now) / remaining_providers;
            let guard = TrialGuard::new(slot);
            let outcome =
                tokio::time::timeout_at(call_deadline, slot.provider.complete(mode, &messages)).await;
            guard.disarm();

            let error = match outcome {
                Ok(Ok(completion)) => {
                    slot.with_breaker(|b| b.record_success());
                    tracing::info!(provider = name, %mode, model = %completion.model, "LunaBug completion");
                    return LunaBugResponse {
                        response: completion.content,
                        provider: name.to_string(),
                        model: Some(completion.model),
                        mode,
                        fallback: false,
                    };
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => "timed out".to_string(),
            };
            let state = slot.with_breaker(|b| {
                b.record_failure();
                b.state()
            });
            tracing::warn!(provider = name, %mode, %error, ?state, "LunaBug provider failed");
        }

        LunaBugResponse {
            response: fallback::respond(mode, request),
            provider: LOCAL_PROVIDER.to_string(),
            model: None,
            mode,
            fallback: true,
        }
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        let now = Instant::now();
        self.providers
            .iter()
            .map(|slot| ProviderStatus {
                name: slot.provider.name().to_string(),
                breaker: slot.with_breaker(|b| b.status_at(now)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::breaker::CircuitState;
    use crate::prompts::ChatMessage;
    use crate::provider::Completion;

    struct FakeProvider {
        name: &'static str,
        failing: AtomicBool,
        hanging: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(name: &'static str, failing: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                failing: AtomicBool::new(failing),
                hanging: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _mode: Mode, _messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hanging.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.failing.load(Ordering::SeqCst) {
                Err(ProviderError::Api {
                    status: 503,
                    body: "unavailable".into(),
                })
            } else {
                Ok(Completion {
                    content: format!("answer from {}", self.name),
                    model: "fake".into(),
                })
            }
        }
    }

    fn request() -> LunaBugRequest {
        LunaBugRequest {
            message: "why is my tap count zero".into(),
            ..Default::default()
        }
    }

    fn config(cooldown: Duration) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            cooldown,
        }
    }

    #[tokio::test]
    async fn skips_provider_after_three_failures() {
        let mistral = FakeProvider::new("mistral", true);
        let perplexity = FakeProvider::new("perplexity", false);
        let luna = LunaBug::new(
            vec![mistral.clone() as Arc<dyn LlmProvider>, perplexity.clone()],
            config(Duration::from_secs(60)),
        );

        for _ in 0..3 {
            let reply = luna.respond(Mode::Ai, &request()).await;
            assert_eq!(reply.provider, "perplexity");
        }
        assert_eq!(mistral.calls(), 3);

        let reply = luna.respond(Mode::Ai, &request()).await;
        assert_eq!(reply.provider, "perplexity");
        assert_eq!(mistral.calls(), 3, "open breaker must not call the provider");

        let status = luna.status();
        assert_eq!(status[0].breaker.state, CircuitState::Open);
        assert_eq!(status[1].breaker.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn retries_provider_after_cooldown() {
        let mistral = FakeProvider::new("mistral", true);
        let luna = LunaBug::new(vec![mistral.clone() as Arc<dyn LlmProvider>], config(Duration::from_millis(50)));

        for _ in 0..3 {
            luna.respond(Mode::Debug, &request()).await;
        }
        luna.respond(Mode::Debug, &request()).await;
        assert_eq!(mistral.calls(), 3);

        tokio::time::sleep(Duration::from_millis(80)).await;
        mistral.failing.store(false, Ordering::SeqCst);

        let reply = luna.respond(Mode::Debug, &request()).await;
        assert_eq!(reply.provider, "mistral");
        assert!(!reply.fallback);
        assert_eq!(mistral.calls(), 4);
        assert_eq!(luna.status()[0].breaker.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn falls_back_locally_when_everything_fails() {
        let luna = LunaBug::new(
            vec![
                FakeProvider::new("mistral", true) as Arc<dyn LlmProvider>,
                FakeProvider::new("perplexity", true),
            ],
            config(Duration::from_secs(60)),
        );
        let reply = luna.respond(Mode::Chat, &request()).await;
        assert!(reply.fallback);
        assert_eq!(reply.provider, LOCAL_PROVIDER);
        assert!(reply.model.is_none());
        assert!(!reply.response.is_empty());
    }

    #[tokio::test]
    async fn no_providers_means_local_only() {
        let luna = LunaBug::from_config(&LunaBugConfig::default()).unwrap();
        assert!(luna.status().is_empty());
        assert!(luna.respond(Mode::Ai, &request()).await.fallback);
    }

    #[tokio::test]
    async fn cancelled_trial_does_not_wedge_the_breaker() {
        let mistral = FakeProvider::new("mistral", true);
        let luna = LunaBug::new(vec![mistral.clone() as Arc<dyn LlmProvider>], config(Duration::from_millis(20)));
        for _ in 0..3 {
            luna.respond(Mode::Debug, &request()).await;
        }
        tokio::time::sleep(Duration::from_millis(40)).await;

        // The half-open trial is dropped mid-call, as a request timeout would.
        mistral.hanging.store(true, Ordering::SeqCst);
        let cancelled = tokio::time::timeout(Duration::from_millis(10), luna.respond(Mode::Debug, &request())).await;
        assert!(cancelled.is_err());
        assert_eq!(luna.status()[0].breaker.state, CircuitState::HalfOpen);

        mistral.hanging.store(false, Ordering::SeqCst);
        mistral.failing.store(false, Ordering::SeqCst);
        let reply = luna.respond(Mode::Debug, &request()).await;
        assert_eq!(reply.provider, "mistral");
        assert_eq!(mistral.calls(), 5);
        assert_eq!(luna.status()[0].breaker.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn hanging_provider_is_cut_off_and_next_one_answers() {
        let mistral = FakeProvider::new("mistral", false);
        mistral.hanging.store(true, Ordering::SeqCst);
        let perplexity = FakeProvider::new("perplexity", false);
        let luna = LunaBug::new(
            vec![mistral.clone() as Arc<dyn LlmProvider>, perplexity.clone()],
            config(Duration::from_secs(60)),
        )
        .with_budget(Duration::from_millis(200));

        let reply = tokio::time::timeout(Duration::from_secs(2), luna.respond(Mode::Ai, &request()))
            .await
            .expect("budget must bound the provider calls");
        assert_eq!(reply.provider, "perplexity");
        assert_eq!(luna.status()[0].breaker.consecutive_failures, 1);
        assert_eq!(perplexity.calls(), 1);
    }

    #[tokio::test]
    async fn spent_budget_answers_locally() {
        let mistral = FakeProvider::new("mistral", false);
        mistral.hanging.store(true, Ordering::SeqCst);
        let luna = LunaBug::new(vec![mistral.clone() as Arc<dyn LlmProvider>], config(Duration::from_secs(60)))
            .with_budget(Duration::from_millis(50));

        let reply = tokio::time::timeout(Duration::from_secs(2), luna.respond(Mode::Chat, &request()))
            .await
            .expect("budget must bound the provider calls");
        assert!(reply.fallback);
        assert_eq!(reply.provider, LOCAL_PROVIDER);
    }
}
