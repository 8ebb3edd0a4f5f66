//! Tests for retry delays and the retry helper

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use rstest::rstest;

use super::{RetryPolicy, materialize_with_retry};
use crate::{FactoryError, FactoryErrorKind, PoolFactory, PoolTuning};

/// Factory that replays a fixed script of outcomes
struct Script {
    outcomes: Mutex<VecDeque<Result<u32, FactoryErrorKind>>>,
    calls: AtomicUsize,
}

impl Script {
    fn new(outcomes: Vec<Result<u32, FactoryErrorKind>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Result<u32, FactoryErrorKind> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Err(FactoryErrorKind::Backend))
    }
}

#[async_trait]
impl PoolFactory for Script {
    type Handle = u32;

    async fn materialize(&self) -> Result<u32, FactoryError> {
        self.next()
            .map_err(|kind| FactoryError::new(kind, "scripted failure"))
    }
}

// =============================================================================
// RetryPolicy delays
// =============================================================================

#[test]
fn test_delay_doubles_and_caps() {
    let policy = RetryPolicy::new(5)
        .with_delays(Duration::from_millis(100), Duration::from_millis(1_000))
        .with_jitter(false);
    assert_eq!(policy.delay_for(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for(1), Duration::from_millis(200));
    assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    assert_eq!(policy.delay_for(4), Duration::from_millis(1_000));
    assert_eq!(policy.delay_for(u32::MAX), Duration::from_millis(1_000));
}

#[test]
fn test_delays_are_clamped() {
    let policy = RetryPolicy::new(1)
        .with_delays(Duration::ZERO, Duration::ZERO)
        .with_jitter(false);
    assert_eq!(policy.delay_for(0), Duration::from_millis(1));
    assert_eq!(policy.delay_for(10), Duration::from_millis(1));
}

#[rstest]
#[case(0)]
#[case(3)]
#[case(20)]
fn test_jitter_never_exceeds_max_delay(#[case] retry: u32) {
    let max = Duration::from_millis(1_000);
    let policy = RetryPolicy::new(3).with_delays(Duration::from_millis(400), max);
    let unjittered = policy.clone().with_jitter(false).delay_for(retry);

    for _ in 0..200 {
        let delay = policy.delay_for(retry);
        assert!(delay <= max, "{delay:?} exceeds {max:?}");
        assert!(delay <= unjittered);
        assert!(delay >= unjittered / 2);
    }
}

#[test]
fn test_for_tuning_caps_at_acquire_timeout() {
    let tuning = PoolTuning::default().with_acquire_timeout_ms(2_000);
    let policy = RetryPolicy::for_tuning(4, &tuning).with_jitter(false);

    assert_eq!(policy.max_attempts(), 4);
    assert_eq!(policy.delay_for(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for(10), tuning.acquire_timeout());
}

#[test]
fn test_default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts(), 3);
    assert!(policy.delay_for(u32::MAX) <= Duration::from_secs(30));
}

// =============================================================================
// materialize_with_retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_from_transient_failures() {
    let script = Script::new(vec![
        Err(FactoryErrorKind::Unreachable),
        Err(FactoryErrorKind::Timeout),
        Ok(7),
    ]);
    let policy = RetryPolicy::new(3)
        .with_delays(Duration::from_millis(10), Duration::from_millis(100));

    let handle = materialize_with_retry(&script, &policy).await.expect("recovered");
    assert_eq!(handle, 7);
    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_stops_on_permanent_failure() {
    let script = Script::new(vec![Err(FactoryErrorKind::Authentication), Ok(1)]);

    let err = materialize_with_retry(&script, &RetryPolicy::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FactoryErrorKind::Authentication);
    assert_eq!(script.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_gives_up_after_max_attempts() {
    let script = Script::new(vec![Err(FactoryErrorKind::Unreachable); 5]);
    let policy = RetryPolicy::new(2)
        .with_delays(Duration::from_millis(10), Duration::from_millis(100));

    let err = materialize_with_retry(&script, &policy).await.unwrap_err();
    assert_eq!(err.kind(), FactoryErrorKind::Unreachable);
    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_retries_is_single_attempt() {
    let script = Script::new(vec![Err(FactoryErrorKind::Timeout), Ok(1)]);
    let policy = RetryPolicy::new(0);

    assert!(materialize_with_retry(&script, &policy).await.is_err());
    assert_eq!(script.calls.load(Ordering::SeqCst), 1);
}
