use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use serde::Serialize;

use crate::errors::{Result, ServiceError};

// A bounded LRU cache of completed request results.  Concurrent
// callers with the same key share a single upstream call and failures
// are never stored, so the next call with that key tries again.
#[derive(Clone)]
pub struct RequestCache<V>
    where V: Clone + Send + Sync + 'static
{
    name: &'static str,
    cache: Cache<String, V>,
}

// the key is the JSON serialisation of the call arguments, so
// arguments must serialise deterministically (no HashMaps)
pub fn cache_key<A: Serialize + ?Sized>(args: &A) -> Result<String> {
    serde_json::to_string(args)
        .map_err(|err| ServiceError::InvalidParameter(format!("can't make cache key: {}", err)))
}

impl<V> RequestCache<V>
    where V: Clone + Send + Sync + 'static
{
    pub fn new(name: &'static str, max_entries: u64) -> RequestCache<V> {
        let cache = Cache::builder()
            .name(name)
            .max_capacity(max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        RequestCache {
            name,
            cache,
        }
    }

    pub async fn fetch<A, F, Fut>(&self, args: &A, fetcher: F) -> Result<V>
        where A: Serialize + ?Sized,
              F: FnOnce() -> Fut,
              Fut: Future<Output = Result<V>>,
    {
        let key = cache_key(args)?;
        self.fetch_with_key(key, fetcher()).await
    }

    async fn fetch_with_key<Fut>(&self, key: String, fut: Fut) -> Result<V>
        where Fut: Future<Output = Result<V>>,
    {
        let name = self.name;
        let key_for_log = key.clone();
        let init = async move {
            tracing::debug!("{} cache miss: {}", name, key_for_log);
            fut.await
        };

        self.cache.try_get_with(key, init).await
            .map_err(|err: Arc<ServiceError>| (*err).clone())
    }

    // Wrap `f` so that calls are keyed on their arguments and served
    // from this cache.
    pub fn memoize<A, F, Fut>(&self, f: F)
          -> impl Fn(A) -> BoxFuture<'static, Result<V>> + Clone + Send + Sync + 'static
        where A: Serialize + Send + 'static,
              F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
              Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let request_cache = self.clone();

        move |args: A| {
            let request_cache = request_cache.clone();
            let f = f.clone();

            Box::pin(async move {
                let key = cache_key(&args)?;
                request_cache.fetch_with_key(key, f(args)).await
            })
        }
    }

    pub fn contains<A: Serialize + ?Sized>(&self, args: &A) -> bool {
        match cache_key(args) {
            Ok(key) => self.cache.contains_key(&key),
            Err(_) => false,
        }
    }

    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}


#[test]
fn test_cache_key() {
    let key = cache_key(&("ncbigene", vec!["TP53", "MDM2"])).unwrap();
    assert_eq!(key, r#"["ncbigene",["TP53","MDM2"]]"#);
    assert_eq!(key, cache_key(&("ncbigene", vec!["TP53", "MDM2"])).unwrap());
    assert_ne!(key, cache_key(&("uniprot", vec!["TP53", "MDM2"])).unwrap());
}
