//! Circuit breaker for outbound service calls.
//!
//! Trips after a run of consecutive failures, rejects calls while open,
//! and probes the downstream with a limited number of half-open requests
//! once the open timeout has elapsed.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, requests flow through.
    Closed,
    /// Downstream considered unhealthy, requests rejected.
    Open,
    /// Probing the downstream with a limited number of requests.
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Name used in log messages.
    pub name: String,
    /// Consecutive failures before the circuit trips.
    pub failure_threshold: u32,
    /// Consecutive half-open successes before the circuit closes.
    pub success_threshold: u32,
    /// How long the circuit stays open before probing.
    pub open_timeout: Duration,
    /// Requests allowed through while half-open.
    pub max_half_open_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "circuit".to_string(),
            failure_threshold: 3,
            success_threshold: 2,
            open_timeout: Duration::from_secs(30),
            max_half_open_requests: 1,
        }
    }
}

struct BreakerState {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    half_open_requests: u32,
    opened_at: Option<Instant>,
    rejected_requests: u64,
    trip_count: u64,
}

impl BreakerState {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            half_open_requests: 0,
            opened_at: None,
            rejected_requests: 0,
            trip_count: 0,
        }
    }

    fn is_request_allowed(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if let Some(opened_at) = self.opened_at {
                    if opened_at.elapsed() >= self.config.open_timeout {
                        self.transition_to_half_open();
                        self.half_open_requests = 1;
                        return true;
                    }
                }
                false
            }
            CircuitState::HalfOpen => {
                if self.half_open_requests < self.config.max_half_open_requests {
                    self.half_open_requests += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.consecutive_successes += 1;

        if self.state == CircuitState::HalfOpen
            && self.consecutive_successes >= self.config.success_threshold
        {
            self.transition_to_closed();
        }
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;

        match self.state {
            CircuitState::Closed => {
                if self.consecutive_failures >= self.config.failure_threshold {
                    self.transition_to_open();
                }
            }
            // Any failure while half-open reopens the circuit.
            CircuitState::HalfOpen => self.transition_to_open(),
            CircuitState::Open => {}
        }
    }

    fn transition_to_open(&mut self) {
        tracing::warn!(circuit = %self.config.name, "circuit opened");
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.trip_count += 1;
        self.half_open_requests = 0;
    }

    fn transition_to_half_open(&mut self) {
        tracing::info!(circuit = %self.config.name, "circuit half-open, probing");
        self.state = CircuitState::HalfOpen;
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.half_open_requests = 0;
    }

    fn transition_to_closed(&mut self) {
        tracing::info!(circuit = %self.config.name, "circuit closed");
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.half_open_requests = 0;
        self.opened_at = None;
    }
}

/// Thread-safe circuit breaker, cheap to clone and share.
#[derive(Clone)]
pub struct CircuitBreaker {
    state: Arc<RwLock<BreakerState>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(BreakerState::new(config))),
        }
    }

    /// Returns true if a request may be attempted. Rejections are
    /// counted; an expired open timeout moves the circuit to half-open.
    pub async fn is_request_allowed(&self) -> bool {
        let mut state = self.state.write().await;
        let allowed = state.is_request_allowed();
        if !allowed {
            state.rejected_requests += 1;
        }
        allowed
    }

    pub async fn record_success(&self) {
        self.state.write().await.record_success();
    }

    pub async fn record_failure(&self) {
        self.state.write().await.record_failure();
    }

    pub async fn state(&self) -> CircuitState {
        self.state.read().await.state
    }

    /// Manually opens the circuit.
    pub async fn trip(&self) {
        self.state.write().await.transition_to_open();
    }

    /// Manually closes the circuit.
    pub async fn reset(&self) {
        self.state.write().await.transition_to_closed();
    }

    pub async fn rejected_requests(&self) -> u64 {
        self.state.read().await.rejected_requests
    }

    pub async fn trip_count(&self) -> u64 {
        self.state.read().await.trip_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: "test-circuit".to_string(),
            failure_threshold: 3,
            success_threshold: 2,
            open_timeout: Duration::from_secs(60),
            max_half_open_requests: 1,
        }
    }

    #[tokio::test]
    async fn test_starts_closed() {
        let circuit = CircuitBreaker::new(test_config());
        assert_eq!(circuit.state().await, CircuitState::Closed);
        assert!(circuit.is_request_allowed().await);
    }

    #[tokio::test]
    async fn test_consecutive_failures_trip() {
        let circuit = CircuitBreaker::new(test_config());

        circuit.record_failure().await;
        circuit.record_failure().await;
        assert_eq!(circuit.state().await, CircuitState::Closed);

        circuit.record_failure().await;
        assert_eq!(circuit.state().await, CircuitState::Open);
        assert!(!circuit.is_request_allowed().await);
        assert_eq!(circuit.rejected_requests().await, 1);
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let circuit = CircuitBreaker::new(test_config());

        circuit.record_failure().await;
        circuit.record_failure().await;
        circuit.record_success().await;

        circuit.record_failure().await;
        circuit.record_failure().await;
        assert_eq!(circuit.state().await, CircuitState::Closed);

        circuit.record_failure().await;
        assert_eq!(circuit.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_open_timeout_moves_to_half_open() {
        let config = CircuitBreakerConfig {
            open_timeout: Duration::from_millis(10),
            ..test_config()
        };
        let circuit = CircuitBreaker::new(config);

        circuit.trip().await;
        assert!(!circuit.is_request_allowed().await);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(circuit.is_request_allowed().await);
        assert_eq!(circuit.state().await, CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn test_half_open_limits_probe_requests() {
        let config = CircuitBreakerConfig {
            open_timeout: Duration::from_millis(1),
            max_half_open_requests: 1,
            ..test_config()
        };
        let circuit = CircuitBreaker::new(config);

        circuit.trip().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(circuit.is_request_allowed().await);
        assert!(!circuit.is_request_allowed().await);
    }

    #[tokio::test]
    async fn test_half_open_successes_close_circuit() {
        let config = CircuitBreakerConfig {
            open_timeout: Duration::from_millis(1),
            max_half_open_requests: 5,
            ..test_config()
        };
        let circuit = CircuitBreaker::new(config);

        circuit.trip().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(circuit.is_request_allowed().await);
        assert_eq!(circuit.state().await, CircuitState::HalfOpen);

        circuit.record_success().await;
        assert_eq!(circuit.state().await, CircuitState::HalfOpen);
        circuit.record_success().await;
        assert_eq!(circuit.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let config = CircuitBreakerConfig {
            open_timeout: Duration::from_millis(1),
            ..test_config()
        };
        let circuit = CircuitBreaker::new(config);

        circuit.trip().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(circuit.is_request_allowed().await);

        circuit.record_failure().await;
        assert_eq!(circuit.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_manual_trip_and_reset() {
        let circuit = CircuitBreaker::new(test_config());

        circuit.trip().await;
        assert_eq!(circuit.state().await, CircuitState::Open);
        assert_eq!(circuit.trip_count().await, 1);

        circuit.reset().await;
        assert_eq!(circuit.state().await, CircuitState::Closed);
        assert!(circuit.is_request_allowed().await);
    }
}
