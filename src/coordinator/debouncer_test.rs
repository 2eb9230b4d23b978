// ABOUTME: Tests for the Debouncer - in-flight sharing, cooldown deferral,
// ABOUTME: trailing runs, non-immediate mode, and shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Notify;
use tokio_test::{assert_pending, assert_ready_eq};

use super::debouncer::Debouncer;
use crate::scheduler::ManualScheduler;

/// Returns a debouncer whose function counts calls and returns the count.
fn counting_debouncer(
    scheduler: &ManualScheduler,
    cooldown: Duration,
    immediate: bool,
) -> (Debouncer<usize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let debouncer = Debouncer::new(
        "test",
        Arc::new(scheduler.clone()),
        cooldown,
        immediate,
        move || {
            let counter = Arc::clone(&counter);
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 }.boxed()
        },
    );
    (debouncer, calls)
}

/// Returns a debouncer whose runs block until `gate` is notified.
fn gated_debouncer(
    scheduler: &ManualScheduler,
    cooldown: Duration,
) -> (Debouncer<usize>, Arc<AtomicUsize>, Arc<Notify>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let counter = Arc::clone(&calls);
    let run_gate = Arc::clone(&gate);
    let debouncer = Debouncer::new(
        "gated",
        Arc::new(scheduler.clone()),
        cooldown,
        true,
        move || {
            let counter = Arc::clone(&counter);
            let gate = Arc::clone(&run_gate);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                gate.notified().await;
                n
            }
            .boxed()
        },
    );
    (debouncer, calls, gate)
}

#[tokio::test]
async fn test_first_call_runs_immediately() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::from_secs(10), true);

    assert_eq!(debouncer.call().await, Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(debouncer.is_cooling_down());
}

#[tokio::test]
async fn test_overlapping_calls_share_one_run() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls, gate) = gated_debouncer(&scheduler, Duration::ZERO);

    let mut first = tokio_test::task::spawn(debouncer.call());
    let mut second = tokio_test::task::spawn(debouncer.call());
    assert_pending!(first.poll());
    assert_pending!(second.poll());
    assert!(debouncer.is_running());

    // Let the detached driver reach the gate, then release it.
    tokio::task::yield_now().await;
    gate.notify_one();
    tokio::task::yield_now().await;

    assert_ready_eq!(first.poll(), Some(1));
    assert_ready_eq!(second.poll(), Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_many_concurrent_calls_collapse() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls, gate) = gated_debouncer(&scheduler, Duration::ZERO);

    let waiters: Vec<_> = (0..8).map(|_| debouncer.call()).collect();
    let release = async {
        tokio::task::yield_now().await;
        gate.notify_one();
    };

    let (outcomes, ()) = tokio::join!(futures::future::join_all(waiters), release);

    assert_eq!(outcomes, vec![Some(1); 8]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_completes_when_callers_dropped() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls, gate) = gated_debouncer(&scheduler, Duration::ZERO);

    let mut caller = tokio_test::task::spawn(debouncer.call());
    assert_pending!(caller.poll());
    drop(caller);

    tokio::task::yield_now().await;
    gate.notify_one();
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    assert!(!debouncer.is_running());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // The next call starts a fresh run.
    let next = tokio::spawn({
        let debouncer = debouncer.clone();
        async move { debouncer.call().await }
    });
    tokio::task::yield_now().await;
    gate.notify_one();
    assert_eq!(next.await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_call_within_cooldown_returns_last_outcome() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::from_secs(10), true);

    assert_eq!(debouncer.call().await, Some(1));
    assert_eq!(debouncer.call().await, Some(1));
    assert_eq!(debouncer.call().await, Some(1));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(debouncer.has_deferred_call());
}

#[tokio::test]
async fn test_deferred_calls_run_once_at_end_of_cooldown() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::from_secs(10), true);

    debouncer.call().await;
    debouncer.call().await;
    debouncer.call().await;

    scheduler.advance(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!debouncer.has_deferred_call());
    // The trailing run restarts the cooldown.
    assert!(debouncer.is_cooling_down());
}

#[tokio::test]
async fn test_cooldown_expires_without_deferred_call() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::from_secs(10), true);

    debouncer.call().await;
    scheduler.advance(Duration::from_secs(10)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!debouncer.is_cooling_down());

    // Outside the cooldown the next call runs straight away.
    assert_eq!(debouncer.call().await, Some(2));
}

#[tokio::test]
async fn test_zero_cooldown_runs_every_sequential_call() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::ZERO, true);

    assert_eq!(debouncer.call().await, Some(1));
    assert_eq!(debouncer.call().await, Some(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test]
async fn test_non_immediate_defers_first_call() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::from_secs(5), false);

    assert_eq!(debouncer.call().await, None);
    assert_eq!(debouncer.call().await, None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    scheduler.advance(Duration::from_secs(5)).await;
    tokio::task::yield_now().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(debouncer.call().await, Some(1));
}

#[tokio::test]
async fn test_shutdown_drops_deferred_call() {
    let scheduler = ManualScheduler::new();
    let (debouncer, calls) = counting_debouncer(&scheduler, Duration::from_secs(10), true);

    debouncer.call().await;
    debouncer.call().await;
    assert!(debouncer.has_deferred_call());

    debouncer.shutdown();
    assert!(!debouncer.is_cooling_down());
    assert_eq!(scheduler.pending(), 0);

    scheduler.advance(Duration::from_secs(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_settings_accessors() {
    let scheduler = ManualScheduler::new();
    let (debouncer, _) = counting_debouncer(&scheduler, Duration::from_millis(250), false);

    assert_eq!(debouncer.cooldown(), Duration::from_millis(250));
    assert!(!debouncer.immediate());
}

#[tokio::test]
async fn test_panicking_run_does_not_wedge_debouncer() {
    let scheduler = ManualScheduler::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let debouncer = Debouncer::new(
        "flaky",
        Arc::new(scheduler.clone()),
        Duration::ZERO,
        true,
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    panic!("first run fails");
                }
                n
            }
            .boxed()
        },
    );

    let first = tokio::spawn({
        let debouncer = debouncer.clone();
        async move { debouncer.call().await }
    })
    .await;
    assert!(first.unwrap_err().is_panic());
    assert!(!debouncer.is_running());

    assert_eq!(debouncer.call().await, Some(2));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
