use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::Rng;
use tracing::{error, info, warn};

use hardhat_core::{Classifier, ClassifierError, ClassifyOptions};

/// Configuration for the ReliableClassifier timeout, retry and circuit breaker behavior.
#[derive(Clone, Debug)]
pub struct ReliableConfig {
    /// Upper bound on a single classification attempt.
    pub call_timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown: Duration,
}

impl Default for ReliableConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(60),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.2,
            circuit_breaker_threshold: 3,
            circuit_breaker_cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum CircuitState {
    Closed,
    Open { since: Instant },
    HalfOpen,
}

/// Wraps a Classifier with a per-attempt timeout, retry of transport errors
/// and a circuit breaker.
///
/// - Timeouts are not retried: a model that is too slow once will be too slow again
/// - Retryable errors back off exponentially with jitter
/// - N consecutive failed calls open the circuit; calls then fail fast with
///   `CircuitOpen` until the cooldown elapses
pub struct ReliableClassifier<C: Classifier> {
    inner: C,
    config: ReliableConfig,
    circuit_state: RwLock<CircuitState>,
    consecutive_failures: AtomicU32,
    total_retries: AtomicU64,
}

impl<C: Classifier> ReliableClassifier<C> {
    pub fn new(inner: C, config: ReliableConfig) -> Self {
        Self {
            inner,
            config,
            circuit_state: RwLock::new(CircuitState::Closed),
            consecutive_failures: AtomicU32::new(0),
            total_retries: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(inner: C) -> Self {
        Self::new(inner, ReliableConfig::default())
    }

    fn check_circuit(&self) -> Result<(), ClassifierError> {
        let state = self.circuit_state.read();
        match &*state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open { since } => {
                if since.elapsed() >= self.config.circuit_breaker_cooldown {
                    drop(state);
                    *self.circuit_state.write() = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(ClassifierError::CircuitOpen)
                }
            }
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let mut state = self.circuit_state.write();
        if *state != CircuitState::Closed {
            info!("circuit breaker closed after successful classification");
            *state = CircuitState::Closed;
        }
    }

    fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.config.circuit_breaker_threshold {
            let mut state = self.circuit_state.write();
            if *state == CircuitState::Closed || *state == CircuitState::HalfOpen {
                warn!(
                    failures,
                    cooldown_secs = self.config.circuit_breaker_cooldown.as_secs(),
                    "circuit breaker opened"
                );
                *state = CircuitState::Open {
                    since: Instant::now(),
                };
            }
        }
    }

    /// Exponential backoff with jitter: base * 2^attempt, capped, then ± jitter.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let exp_delay = self.config.base_delay.as_millis() as f64 * 2.0_f64.powi(attempt as i32);
        let capped = exp_delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = capped * self.config.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter).max(10.0) as u64)
    }

    async fn attempt(&self, prompt: &str, options: &ClassifyOptions) -> Result<String, ClassifierError> {
        match tokio::time::timeout(self.config.call_timeout, self.inner.classify(prompt, options)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.config.call_timeout)),
        }
    }

    pub fn total_retries(&self) -> u64 {
        self.total_retries.load(Ordering::Relaxed)
    }

    /// Circuit breaker state as logged: `closed`, `open` or `half_open`.
    pub fn circuit_state_name(&self) -> &'static str {
        match &*self.circuit_state.read() {
            CircuitState::Closed => "closed",
            CircuitState::Open { .. } => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[async_trait]
impl<C: Classifier> Classifier for ReliableClassifier<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn classify(
        &self,
        prompt: &str,
        options: &ClassifyOptions,
    ) -> Result<String, ClassifierError> {
        self.check_circuit()?;

        let mut attempt = 0;
        loop {
            match self.attempt(prompt, options).await {
                Ok(reply) => {
                    self.record_success();
                    return Ok(reply);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.retry_delay(attempt);
                    self.total_retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying classification"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.record_failure();
                    let circuit = self.circuit_state_name();
                    if e.is_fatal() {
                        error!(error_kind = e.error_kind(), circuit, error = %e, "classification rejected, check model and host");
                    } else {
                        warn!(error_kind = e.error_kind(), circuit, error = %e, "classification failed");
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClassifier, MockResponse};

    fn server_error() -> MockResponse {
        MockResponse::Error(ClassifierError::ServerError {
            status: 500,
            body: "internal".into(),
        })
    }

    fn fast_config() -> ReliableConfig {
        ReliableConfig {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn success_on_first_try() {
        let reliable = ReliableClassifier::with_defaults(MockClassifier::new(vec![MockResponse::text("ROOF")]));
        let reply = reliable.classify("x", &ClassifyOptions::default()).await.unwrap();
        assert_eq!(reply, "ROOF");
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn retries_on_retryable_error() {
        let mock = MockClassifier::new(vec![server_error(), server_error(), MockResponse::text("CHAT")]);
        let reliable = ReliableClassifier::new(mock, fast_config());

        let reply = reliable.classify("x", &ClassifyOptions::default()).await.unwrap();
        assert_eq!(reply, "CHAT");
        assert_eq!(reliable.total_retries(), 2);
    }

    #[tokio::test]
    async fn fatal_error_not_retried() {
        let mock = MockClassifier::new(vec![
            MockResponse::Error(ClassifierError::ModelNotFound("llama3".into())),
            MockResponse::text("should not reach"),
        ]);
        let reliable = ReliableClassifier::new(mock, fast_config());

        let err = reliable.classify("x", &ClassifyOptions::default()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::ModelNotFound(_)));
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn max_retries_exhausted() {
        let mock = MockClassifier::new(vec![server_error(), server_error(), server_error()]);
        let reliable = ReliableClassifier::new(mock, fast_config());

        assert!(reliable.classify("x", &ClassifyOptions::default()).await.is_err());
        assert_eq!(reliable.total_retries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let mock = MockClassifier::new(vec![MockResponse::delayed(
            Duration::from_secs(120),
            MockResponse::text("too late"),
        )]);
        let config = ReliableConfig {
            call_timeout: Duration::from_secs(30),
            ..fast_config()
        };
        let reliable = ReliableClassifier::new(mock, config);

        let err = reliable.classify("x", &ClassifyOptions::default()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn circuit_breaker_trips_after_threshold() {
        let mock = MockClassifier::new(vec![
            server_error(),
            server_error(),
            server_error(),
            MockResponse::text("unreachable"),
        ]);
        let config = ReliableConfig {
            max_retries: 0,
            circuit_breaker_threshold: 3,
            ..fast_config()
        };
        let reliable = ReliableClassifier::new(mock, config);
        let opts = ClassifyOptions::default();

        for _ in 0..3 {
            let _ = reliable.classify("x", &opts).await;
        }
        assert_eq!(reliable.circuit_state_name(), "open");

        let err = reliable.classify("x", &opts).await.unwrap_err();
        assert!(matches!(err, ClassifierError::CircuitOpen));
        assert_eq!(reliable.inner.call_count(), 3);
    }

    #[tokio::test]
    async fn circuit_breaker_recovers_after_cooldown() {
        let mock = MockClassifier::new(vec![
            server_error(),
            server_error(),
            server_error(),
            MockResponse::text("FOUNDATION"),
        ]);
        let config = ReliableConfig {
            max_retries: 0,
            circuit_breaker_threshold: 3,
            circuit_breaker_cooldown: Duration::from_millis(30),
            ..fast_config()
        };
        let reliable = ReliableClassifier::new(mock, config);
        let opts = ClassifyOptions::default();

        for _ in 0..3 {
            let _ = reliable.classify("x", &opts).await;
        }
        assert_eq!(reliable.circuit_state_name(), "open");

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(reliable.classify("x", &opts).await.unwrap(), "FOUNDATION");
        assert_eq!(reliable.circuit_state_name(), "closed");
    }

    #[test]
    fn retry_delay_exponential_backoff() {
        let config = ReliableConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.0,
            ..Default::default()
        };
        let reliable = ReliableClassifier::new(MockClassifier::new(vec![]), config);

        assert_eq!(reliable.retry_delay(0).as_millis(), 100);
        assert_eq!(reliable.retry_delay(1).as_millis(), 200);
        assert_eq!(reliable.retry_delay(2).as_millis(), 400);
    }

    #[test]
    fn retry_delay_capped_at_max() {
        let config = ReliableConfig {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.0,
            ..Default::default()
        };
        let reliable = ReliableClassifier::new(MockClassifier::new(vec![]), config);
        assert_eq!(reliable.retry_delay(10).as_millis(), 5000);
    }

    #[test]
    fn retry_delay_jitter_stays_in_range() {
        let config = ReliableConfig {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.2,
            ..Default::default()
        };
        let reliable = ReliableClassifier::new(MockClassifier::new(vec![]), config);
        for _ in 0..50 {
            let ms = reliable.retry_delay(0).as_millis();
            assert!((800..=1200).contains(&ms), "got {ms}");
        }
    }

    #[test]
    fn delegates_properties() {
        let reliable = ReliableClassifier::with_defaults(MockClassifier::new(vec![]));
        assert_eq!(reliable.name(), "mock");
        assert_eq!(reliable.model(), "mock-model");
    }
}
