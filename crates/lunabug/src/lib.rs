//! LunaBug: an AI debugging assistant that proxies prompts to hosted LLM
//! providers, with a circuit breaker per provider and a local fallback.

pub mod breaker;
pub mod config;
pub mod fallback;
pub mod prompts;
pub mod provider;
pub mod router;

pub use breaker::{BreakerStatus, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::LunaBugConfig;
pub use prompts::{ChatMessage, LunaBugRequest, Mode};
pub use provider::{Completion, LlmProvider, OpenAiCompatibleProvider, ProviderError};
pub use router::{LunaBug, LunaBugResponse, ProviderStatus};
