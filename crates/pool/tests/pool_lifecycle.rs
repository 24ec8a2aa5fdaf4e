use porygo_core::Error;
use porygo_pool::{CancellationToken, PoolState, WorkItem, WorkOutput, WorkerPool};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

fn collect_results<T: Send + 'static>(pool: &WorkerPool<T>) -> JoinHandle<Vec<WorkOutput<T>>> {
    let stream = pool.take_results().unwrap();
    tokio::spawn(async move { stream.collect::<Vec<_>>().await })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_submitted_item_yields_one_result() {
    let pool = WorkerPool::new(3, 3);
    let cancel = CancellationToken::new();
    let consumer = collect_results(&pool);
    pool.start(&cancel).unwrap();

    for i in 0..20usize {
        pool.submit(
            &cancel,
            WorkItem::new(format!("item-{i}"), move || async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(i * 2)
            }),
        )
        .await
        .unwrap();
    }
    pool.shutdown().await;

    let results = consumer.await.unwrap();
    assert_eq!(results.len(), 20);
    let labels: HashSet<_> = results.iter().map(|r| r.label.clone()).collect();
    assert_eq!(labels.len(), 20);
    assert!(results.iter().all(|r| r.result.is_ok()));
    assert_eq!(pool.state(), PoolState::Closed);
}

#[tokio::test(start_paused = true)]
async fn cancellation_lets_the_running_item_finish_and_stops_dequeues() {
    let pool = WorkerPool::new(1, 4);
    let cancel = CancellationToken::new();
    let consumer = collect_results(&pool);
    pool.start(&cancel).unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let (started_tx, started_rx) = oneshot::channel();

    let counter = Arc::clone(&ran);
    pool.submit(
        &cancel,
        WorkItem::new("in-flight", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = started_tx.send(());
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok("done")
        }),
    )
    .await
    .unwrap();

    for name in ["queued-1", "queued-2"] {
        let counter = Arc::clone(&ran);
        pool.submit(
            &cancel,
            WorkItem::new(name, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("should not run")
            }),
        )
        .await
        .unwrap();
    }

    started_rx.await.unwrap();
    cancel.cancel();

    let late = pool
        .submit(&cancel, WorkItem::new("late", || async { Ok("late") }))
        .await
        .unwrap_err();
    assert!(late.is_cancelled());

    pool.shutdown().await;
    let results = consumer.await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].label, "in-flight");
    assert_eq!(results[0].result.as_ref().unwrap(), &"done");
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_panicking_item_fails_alone() {
    let pool = WorkerPool::new(2, 4);
    let cancel = CancellationToken::new();
    let consumer = collect_results(&pool);
    pool.start(&cancel).unwrap();

    pool.submit(
        &cancel,
        WorkItem::new("boom", || async {
            if true {
                panic!("parser exploded");
            }
            Ok(0u8)
        }),
    )
    .await
    .unwrap();
    for i in 1..=3u8 {
        pool.submit(&cancel, WorkItem::new(format!("ok-{i}"), move || async move { Ok(i) }))
            .await
            .unwrap();
    }
    pool.shutdown().await;

    let results = consumer.await.unwrap();
    assert_eq!(results.len(), 4);

    let boom = results.iter().find(|r| r.label == "boom").unwrap();
    match &boom.result {
        Err(Error::WorkerPanic { label, message }) => {
            assert_eq!(label, "boom");
            assert!(message.contains("parser exploded"));
        }
        other => panic!("expected a worker panic, got {other:?}"),
    }
    assert_eq!(results.iter().filter(|r| r.result.is_ok()).count(), 3);
}

#[tokio::test]
async fn submit_after_shutdown_fails_fast() {
    let pool = WorkerPool::new(1, 1);
    let cancel = CancellationToken::new();
    let consumer = collect_results(&pool);
    pool.start(&cancel).unwrap();
    pool.shutdown().await;

    let err = tokio::time::timeout(
        Duration::from_secs(1),
        pool.submit(&cancel, WorkItem::new("after", || async { Ok(()) })),
    )
    .await
    .expect("submit must not block on a closed pool")
    .unwrap_err();

    assert!(matches!(err, Error::PoolClosed { .. }));
    assert!(consumer.await.unwrap().is_empty());
}

#[tokio::test]
async fn submit_waiting_for_room_is_cancellable() {
    // Not started, so the single slot never drains
    let pool = WorkerPool::new(1, 1);
    let cancel = CancellationToken::new();
    pool.submit(&cancel, WorkItem::new("first", || async { Ok(()) }))
        .await
        .unwrap();

    let blocked_cancel = cancel.clone();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        blocked_cancel.cancel();
    });

    let err = pool
        .submit(&cancel, WorkItem::new("second", || async { Ok(()) }))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    canceller.await.unwrap();
}
