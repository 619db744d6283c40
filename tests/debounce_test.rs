//! Tests for [`Debouncer`] — trailing-edge debounce with a fixed quiet
//! period, driven by the paused tokio clock.

use std::time::Duration;

use requery::Debouncer;
use tokio::time::{Instant, advance, timeout};

const D: Duration = Duration::from_millis(500);

/// Give spawned timer tasks a chance to register their sleeps before the
/// clock moves.
async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn burst_emits_once_with_last_value() {
    let (mut debouncer, mut settled) = Debouncer::new(D);
    let start = Instant::now();

    debouncer.notify("a".to_owned());
    settle_tasks().await;
    advance(Duration::from_millis(100)).await;
    debouncer.notify("ab".to_owned());
    settle_tasks().await;

    assert_eq!(settled.recv().await.as_deref(), Some("ab"));
    assert_eq!(start.elapsed(), Duration::from_millis(600));

    // Exactly one emission for the burst.
    assert!(
        timeout(Duration::from_secs(5), settled.recv())
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_suppresses_emission() {
    let (mut debouncer, mut settled) = Debouncer::new(D);

    debouncer.notify("abc".to_owned());
    settle_tasks().await;
    advance(Duration::from_millis(400)).await;
    debouncer.cancel();

    assert!(
        timeout(Duration::from_secs(5), settled.recv())
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn identical_value_still_restarts_timer() {
    let (mut debouncer, mut settled) = Debouncer::new(D);
    let start = Instant::now();

    debouncer.notify("same".to_owned());
    settle_tasks().await;
    advance(Duration::from_millis(400)).await;
    debouncer.notify("same".to_owned());
    settle_tasks().await;

    // Debounce is value-blind: the timer restarted at t=400, so the
    // emission lands at 900, not 500.
    assert_eq!(settled.recv().await.as_deref(), Some("same"));
    assert_eq!(start.elapsed(), Duration::from_millis(900));
}

#[tokio::test(start_paused = true)]
async fn empty_value_debounces_like_any_other() {
    let (mut debouncer, mut settled) = Debouncer::new(D);

    debouncer.notify(String::new());
    assert_eq!(settled.recv().await.as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn notify_after_cancel_emits() {
    let (mut debouncer, mut settled) = Debouncer::new(D);

    debouncer.notify("dropped".to_owned());
    settle_tasks().await;
    debouncer.cancel();
    debouncer.notify("kept".to_owned());
    settle_tasks().await;

    assert_eq!(settled.recv().await.as_deref(), Some("kept"));
}

#[tokio::test(start_paused = true)]
async fn drop_cancels_pending_timer() {
    let (mut debouncer, mut settled) = Debouncer::new(D);

    debouncer.notify("ghost".to_owned());
    settle_tasks().await;
    drop(debouncer);

    // The stream ends without a ghost emission.
    assert_eq!(settled.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn consecutive_bursts_each_emit() {
    let (mut debouncer, mut settled) = Debouncer::new(D);

    debouncer.notify("first".to_owned());
    settle_tasks().await;
    assert_eq!(settled.recv().await.as_deref(), Some("first"));

    debouncer.notify("second".to_owned());
    settle_tasks().await;
    assert_eq!(settled.recv().await.as_deref(), Some("second"));
}
