use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use bomatic::application::services::{ModelLimits, RateLimiter};

#[tokio::test]
async fn given_two_slots_when_both_held_then_none_available_until_drop() {
    let limiter = RateLimiter::with_models(
        ModelLimits::default(),
        [("model-a".to_string(), ModelLimits::new(2, 0, 0))],
    );

    let first = limiter.acquire("model-a", 10).await.unwrap();
    let second = limiter.acquire("model-a", 10).await.unwrap();
    assert_eq!(limiter.available_slots("model-a").await, 0);

    drop(first);
    assert_eq!(limiter.available_slots("model-a").await, 1);

    drop(second);
    assert_eq!(limiter.available_slots("model-a").await, 2);
}

#[tokio::test]
async fn given_held_slot_when_waiter_is_cancelled_then_slot_is_not_leaked() {
    let limiter = Arc::new(RateLimiter::with_models(
        ModelLimits::default(),
        [("model-a".to_string(), ModelLimits::new(1, 0, 0))],
    ));

    let held = limiter.acquire("model-a", 1).await.unwrap();

    let waiter = tokio::time::timeout(Duration::from_millis(50), limiter.acquire("model-a", 1)).await;
    assert!(waiter.is_err());

    drop(held);
    assert_eq!(limiter.available_slots("model-a").await, 1);

    let again = limiter.acquire("model-a", 1).await.unwrap();
    assert_eq!(again.model(), "model-a");
}

#[tokio::test]
async fn given_permit_used_in_failing_call_when_error_returned_then_slot_released() {
    let limiter = RateLimiter::with_models(
        ModelLimits::default(),
        [("model-a".to_string(), ModelLimits::new(1, 0, 0))],
    );

    let call = async {
        let _permit = limiter.acquire("model-a", 1).await.unwrap();
        Err::<(), &str>("provider exploded")
    };
    assert!(call.await.is_err());

    assert_eq!(limiter.available_slots("model-a").await, 1);
}

#[tokio::test(start_paused = true)]
async fn given_request_budget_used_when_acquiring_then_waits_for_window_to_slide() {
    // 90% of 2 rpm rounds up to a budget of 2 requests per window.
    let limiter = RateLimiter::with_models(
        ModelLimits::default(),
        [("model-a".to_string(), ModelLimits::new(5, 2, 0))],
    );

    let start = Instant::now();
    let _a = limiter.acquire("model-a", 1).await.unwrap();
    let _b = limiter.acquire("model-a", 1).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));

    let _c = limiter.acquire("model-a", 1).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert!(start.elapsed() <= Duration::from_secs(62));
}

#[tokio::test(start_paused = true)]
async fn given_zero_rpm_when_acquiring_many_then_never_waits() {
    let limiter = RateLimiter::new(ModelLimits::new(1, 0, 0));

    let start = Instant::now();
    for _ in 0..50 {
        let _permit = limiter.acquire("anything", 1).await.unwrap();
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn given_large_estimate_when_acquiring_then_warning_is_attached_but_call_proceeds() {
    let limiter = RateLimiter::with_models(
        ModelLimits::default(),
        [("model-a".to_string(), ModelLimits::new(1, 0, 1_000))],
    );

    let heavy = limiter.acquire("model-a", 950).await.unwrap();
    let warning = heavy.token_warning().unwrap();
    assert_eq!(warning.estimated_tokens, 950);
    assert_eq!(warning.threshold, 900);
    drop(heavy);

    let light = limiter.acquire("model-a", 100).await.unwrap();
    assert!(light.token_warning().is_none());
}

#[tokio::test]
async fn given_unregistered_model_when_acquiring_then_default_limits_apply() {
    let limiter = RateLimiter::new(ModelLimits::new(3, 100, 10_000));

    let _permit = limiter.acquire("new-model", 1).await.unwrap();

    assert_eq!(limiter.limits("new-model").await, ModelLimits::new(3, 100, 10_000));
    assert_eq!(limiter.available_slots("new-model").await, 2);
}

#[tokio::test]
async fn given_models_when_taking_snapshot_then_sorted_and_counts_recent_requests() {
    let limiter = RateLimiter::with_models(
        ModelLimits::default(),
        [
            ("zeta".to_string(), ModelLimits::new(1, 100, 0)),
            ("alpha".to_string(), ModelLimits::new(2, 100, 0)),
        ],
    );
    let _permit = limiter.acquire("alpha", 1).await.unwrap();

    let snapshot = limiter.snapshot().await;

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].model, "alpha");
    assert_eq!(snapshot[0].available_slots, 1);
    assert_eq!(snapshot[0].recent_requests, 1);
    assert_eq!(snapshot[1].model, "zeta");
    assert_eq!(snapshot[1].recent_requests, 0);
}

#[test]
fn given_zero_concurrency_when_building_limits_then_clamped_to_one() {
    assert_eq!(ModelLimits::new(0, 10, 10).max_concurrent, 1);
}
