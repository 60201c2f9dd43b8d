//! Admission timing of the fixed-window rate limiter, run on tokio's
//! paused clock.

use std::sync::Arc;

use lodestar_core::{RateLimit, RateLimiter, Scope};
use tokio::sync::Mutex;
use tokio::time::{advance, Duration, Instant};

async fn admit_all(limiter: &RateLimiter, callers: usize) -> Vec<Duration> {
    let start = Instant::now();
    let admitted = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for _ in 0..callers {
        let limiter = limiter.clone();
        let admitted = Arc::clone(&admitted);
        handles.push(tokio::spawn(async move {
            limiter.acquire("fetch").await;
            admitted.lock().await.push(start.elapsed());
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut times = admitted.lock().await.clone();
    times.sort();
    times
}

#[tokio::test(start_paused = true)]
async fn test_window_admission_invariant() {
    let limiter = RateLimiter::per_operation(3, 10).unwrap();
    let times = admit_all(&limiter, 10).await;
    assert_eq!(times.len(), 10);

    let first = times[0];
    let window = Duration::from_secs(10);
    let mut per_window = std::collections::BTreeMap::new();
    for t in &times {
        let bucket = (*t - first).as_secs() / window.as_secs();
        *per_window.entry(bucket).or_insert(0) += 1;
    }
    assert!(per_window.values().all(|&n| n <= 3), "{per_window:?}");
    assert_eq!(per_window.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_waiting_callers_are_admitted_at_window_boundaries() {
    let limiter = RateLimiter::per_operation(2, 5).unwrap();
    let times = admit_all(&limiter, 5).await;
    assert_eq!(
        times,
        vec![
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(5),
            Duration::from_secs(5),
            Duration::from_secs(10),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_example_two_per_five_seconds() {
    let limiter = RateLimiter::per_operation(2, 5).unwrap();
    let start = Instant::now();

    limiter.acquire("a").await;
    advance(Duration::from_millis(100)).await;
    limiter.acquire("a").await;
    advance(Duration::from_millis(100)).await;

    let cooldown = limiter.cooldown("a").await.unwrap();
    assert_eq!(cooldown, Duration::from_millis(4800));

    limiter.acquire("a").await;
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert_eq!(limiter.calls_in_window("a").await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_budget_resets_after_idle_window() {
    let limiter = RateLimiter::per_operation(1, 2).unwrap();
    limiter.acquire("a").await;
    advance(Duration::from_secs(3)).await;
    assert!(limiter.cooldown("a").await.is_none());

    let before = Instant::now();
    limiter.acquire("a").await;
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_boundary_burst_is_allowed() {
    let limiter = RateLimiter::per_operation(2, 10).unwrap();
    let start = Instant::now();

    limiter.acquire("a").await;
    advance(Duration::from_millis(9_900)).await;
    limiter.acquire("a").await;
    advance(Duration::from_millis(100)).await;
    limiter.acquire("a").await;
    limiter.acquire("a").await;

    // Four admissions within 10.1 seconds: two at the end of one window,
    // two at the start of the next.
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_operation_override_in_per_operation_scope() {
    let limiter = RateLimiter::new(RateLimit::new(1, 60).unwrap(), Scope::PerOperation)
        .with_operation_limit("bulk", RateLimit::new(3, 60).unwrap())
        .unwrap();
    let start = Instant::now();
    for _ in 0..3 {
        limiter.acquire("bulk").await;
    }
    limiter.acquire("single").await;
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(limiter.cooldown("bulk").await.is_some());
    assert!(limiter.cooldown("single").await.is_some());
}
