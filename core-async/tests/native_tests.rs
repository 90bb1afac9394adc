//! Integration tests for the runtime facade.

use core_async::{sync, task, time};
use std::sync::Arc;

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[tokio::test]
async fn test_timeout_success() {
    let result = time::timeout(time::Duration::from_millis(200), async {
        time::sleep(time::Duration::from_millis(10)).await;
        7
    })
    .await;

    assert_eq!(result.unwrap(), 7);
}

#[tokio::test]
async fn test_timeout_elapsed() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(200)).await;
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_oneshot_written_once() {
    let (tx, rx) = sync::oneshot::channel::<&'static str>();
    let slot = Arc::new(sync::Mutex::new(Some(tx)));

    for value in ["first", "second"] {
        let slot = Arc::clone(&slot);
        task::spawn(async move {
            if let Some(sender) = slot.lock().await.take() {
                let _ = sender.send(value);
            }
        })
        .await
        .unwrap();
    }

    assert_eq!(rx.await.unwrap(), "first");
    assert!(slot.lock().await.is_none());
}

#[tokio::test]
async fn test_pause_zero_returns_immediately() {
    let start = time::Instant::now();
    time::pause(time::Duration::ZERO).await;
    assert!(start.elapsed() < time::Duration::from_millis(50));
}

#[test]
fn test_backoff_delay_doubles() {
    let base = time::Duration::from_millis(100);
    assert_eq!(time::backoff_delay(base, 0), time::Duration::from_millis(100));
    assert_eq!(time::backoff_delay(base, 1), time::Duration::from_millis(200));
    assert_eq!(time::backoff_delay(base, 3), time::Duration::from_millis(800));
}

#[test]
fn test_block_on_runs_future() {
    let value = core_async::runtime::block_on(async { 1 + 1 }).unwrap();
    assert_eq!(value, 2);
}
