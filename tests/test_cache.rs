use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pathways::cache::RequestCache;
use pathways::errors::ServiceError;

#[tokio::test]
async fn test_concurrent_requests_are_coalesced() {
    let cache: RequestCache<String> = RequestCache::new("test", 10);
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = |value: &'static str| {
        let calls = calls.clone();
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, ServiceError>(value.to_owned())
        }
    };

    let (first, second) =
        tokio::join!(cache.fetch(&("TP53", 1), fetch("first")),
                     cache.fetch(&("TP53", 1), fetch("second")));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.unwrap(), "first");
    assert_eq!(second.unwrap(), "first");
}

#[tokio::test]
async fn test_completed_results_are_reused() {
    let cache: RequestCache<u32> = RequestCache::new("test", 10);
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let value = cache.fetch("key", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ServiceError>(42)
        }).await;
        assert_eq!(value, Ok(42));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let other = cache.fetch("other key", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, ServiceError>(7)
    }).await;
    assert_eq!(other, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let cache: RequestCache<String> = RequestCache::new("test", 10);
    let calls = AtomicUsize::new(0);

    let first = cache.fetch("key", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<String, _>(ServiceError::Transport("timed out".into()))
    }).await;
    assert_eq!(first, Err(ServiceError::Transport("timed out".into())));
    assert!(!cache.contains("key"));

    let second = cache.fetch("key", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, ServiceError>("ok".to_owned())
    }).await;
    assert_eq!(second, Ok("ok".to_owned()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_coalesced_callers_share_a_failure() {
    let cache: RequestCache<String> = RequestCache::new("test", 10);
    let calls = Arc::new(AtomicUsize::new(0));

    let failing_fetch = || {
        let calls = calls.clone();
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<String, _>(ServiceError::Transport("reset".into()))
        }
    };

    let (first, second) =
        tokio::join!(cache.fetch("key", failing_fetch()), cache.fetch("key", failing_fetch()));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(first, Err(ServiceError::Transport(_))));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_memoize() {
    let cache: RequestCache<String> = RequestCache::new("test", 10);
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch_calls = calls.clone();
    let memoized = cache.memoize(move |(name, count): (String, u32)| {
        let calls = fetch_calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ServiceError>(format!("{}:{}", name, count))
        }
    });

    assert_eq!(memoized(("MDM2".into(), 1)).await, Ok("MDM2:1".to_owned()));
    assert_eq!(memoized(("MDM2".into(), 1)).await, Ok("MDM2:1".to_owned()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(memoized(("MDM2".into(), 2)).await, Ok("MDM2:2".to_owned()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_least_recently_used_entry_is_evicted() {
    let cache: RequestCache<u32> = RequestCache::new("test", 2);

    cache.fetch("a", || async { Ok::<_, ServiceError>(1) }).await.unwrap();
    cache.run_pending_tasks().await;
    cache.fetch("b", || async { Ok::<_, ServiceError>(2) }).await.unwrap();
    cache.run_pending_tasks().await;

    // use "a" so that "b" is the least recently used
    cache.fetch("a", || async { Ok::<_, ServiceError>(100) }).await.unwrap();
    cache.run_pending_tasks().await;

    cache.fetch("c", || async { Ok::<_, ServiceError>(3) }).await.unwrap();
    cache.run_pending_tasks().await;

    assert_eq!(cache.entry_count(), 2);
    assert!(cache.contains("a"));
    assert!(!cache.contains("b"));
    assert!(cache.contains("c"));
}
