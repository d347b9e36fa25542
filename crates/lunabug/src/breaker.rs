//! Per-provider circuit breaker.
//!
//! Closed: requests flow. After `failure_threshold` consecutive failures the
//! breaker opens and the provider is skipped for `cooldown`. Once the
//! cooldown has elapsed a single trial request is let through (half-open);
//! its success closes the breaker, its failure re-opens it. A trial that
//! never reports back (its request was cancelled) stops holding the slot
//! once another cooldown has passed, or immediately via `release_trial`.

use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening.
    pub failure_threshold: u32,
    /// How long an open breaker rejects requests.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Point-in-time view for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStatus {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Seconds until an open breaker allows a trial request.
    pub retry_in_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    trial_started_at: Option<Instant>,
    config: CircuitBreakerConfig,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            opened_at: None,
            trial_started_at: None,
            config,
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Whether a request may be sent at `now`. Moving from open to half-open
    /// claims the single trial slot.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled = self
                    .opened_at
                    .is_some_and(|at| now.duration_since(at) >= self.config.cooldown);
                if cooled {
                    self.state = CircuitState::HalfOpen;
                    self.trial_started_at = Some(now);
                }
                cooled
            }
            CircuitState::HalfOpen => {
                let free = self
                    .trial_started_at
                    .map_or(true, |at| now.duration_since(at) >= self.config.cooldown);
                if free {
                    self.trial_started_at = Some(now);
                }
                free
            }
        }
    }

    /// Give back a half-open trial slot whose request ended without an
    /// outcome. The breaker stays half-open.
    pub fn release_trial(&mut self) {
        self.trial_started_at = None;
    }

    pub fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.opened_at = None;
        self.trial_started_at = None;
    }

    pub fn record_failure(&mut self) {
        self.record_failure_at(Instant::now());
    }

    pub fn record_failure_at(&mut self, now: Instant) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.trial_started_at = None;

        let trip = self.state == CircuitState::HalfOpen
            || self.failure_count >= self.config.failure_threshold;
        if trip {
            self.state = CircuitState::Open;
            self.opened_at = Some(now);
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn status_at(&self, now: Instant) -> BreakerStatus {
        let retry_in_secs = match (self.state, self.opened_at) {
            (CircuitState::Open, Some(at)) => Some(
                self.config
                    .cooldown
                    .saturating_sub(now.duration_since(at))
                    .as_secs(),
            ),
            _ => None,
        };
        BreakerStatus {
            state: self.state,
            consecutive_failures: self.failure_count,
            retry_in_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        })
    }

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let mut b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        b.record_failure_at(t0);
        assert!(b.try_acquire_at(t0));
        b.record_failure_at(t0);
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.try_acquire_at(t0 + Duration::from_secs(59)));
    }

    #[test]
    fn success_resets_the_count() {
        let mut b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        b.record_failure_at(t0);
        b.record_success();
        b.record_failure_at(t0);
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.failure_count(), 1);
    }

    #[test]
    fn half_open_allows_exactly_one_trial() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure_at(t0);
        }
        let later = t0 + Duration::from_secs(60);
        assert!(b.try_acquire_at(later));
        assert_eq!(b.state(), CircuitState::HalfOpen);
        assert!(!b.try_acquire_at(later));

        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.try_acquire_at(later));
    }

    #[test]
    fn failed_trial_reopens_with_fresh_cooldown() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure_at(t0);
        }
        let trial = t0 + Duration::from_secs(61);
        assert!(b.try_acquire_at(trial));
        b.record_failure_at(trial);
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.try_acquire_at(trial + Duration::from_secs(30)));
        assert_eq!(b.status_at(trial + Duration::from_secs(30)).retry_in_secs, Some(30));
    }

    #[test]
    fn abandoned_trial_expires_after_another_cooldown() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure_at(t0);
        }
        let trial = t0 + Duration::from_secs(60);
        assert!(b.try_acquire_at(trial));
        // No outcome is ever recorded for that trial.
        assert!(!b.try_acquire_at(trial + Duration::from_secs(59)));
        assert!(b.try_acquire_at(trial + Duration::from_secs(60)));
        assert_eq!(b.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn released_trial_is_granted_again() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure_at(t0);
        }
        let trial = t0 + Duration::from_secs(60);
        assert!(b.try_acquire_at(trial));
        b.release_trial();
        assert_eq!(b.state(), CircuitState::HalfOpen);
        assert!(b.try_acquire_at(trial));
        assert!(!b.try_acquire_at(trial));
    }
}
