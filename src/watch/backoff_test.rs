use std::time::Duration;

use super::*;
use crate::BackoffPolicy;

fn policy(
    base_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: u32,
) -> BackoffPolicy {
    BackoffPolicy {
        base_delay_ms,
        max_delay_ms,
        multiplier,
    }
}

#[test]
fn test_delays_double_up_to_ceiling() {
    let mut backoff = Backoff::new(policy(1000, 30_000, 2));

    let delays: Vec<u64> = (0..8).map(|_| backoff.on_failure().as_millis() as u64).collect();

    assert_eq!(
        delays,
        vec![1000, 2000, 4000, 8000, 16_000, 30_000, 30_000, 30_000]
    );
    assert_eq!(backoff.consecutive_failures(), 8);
}

#[test]
fn test_nth_failure_matches_closed_form() {
    let base = 250u64;
    let max = 10_000u64;

    for n in 0..12u32 {
        let mut backoff = Backoff::new(policy(base, max, 2));
        for _ in 0..n {
            backoff.on_failure();
        }
        let expected = (base * 2u64.pow(n)).min(max);
        assert_eq!(backoff.on_failure(), Duration::from_millis(expected), "after {n} failures");
    }
}

#[test]
fn test_reset_restores_floor() {
    let mut backoff = Backoff::new(policy(1000, 60_000, 2));
    backoff.on_failure();
    backoff.on_failure();
    backoff.on_failure();

    backoff.reset();

    assert_eq!(backoff.consecutive_failures(), 0);
    assert_eq!(backoff.current_delay(), Duration::from_secs(1));
    assert_eq!(backoff.on_failure(), Duration::from_secs(1));
}

#[test]
fn test_multiplier_one_keeps_constant_delay() {
    let mut backoff = Backoff::new(policy(500, 60_000, 1));

    for _ in 0..5 {
        assert_eq!(backoff.on_failure(), Duration::from_millis(500));
    }
}

#[test]
fn test_huge_multiplier_saturates_at_ceiling() {
    let mut backoff = Backoff::new(policy(1000, 5000, u32::MAX));

    assert_eq!(backoff.on_failure(), Duration::from_secs(1));
    assert_eq!(backoff.on_failure(), Duration::from_secs(5));
    assert_eq!(backoff.on_failure(), Duration::from_secs(5));
}
