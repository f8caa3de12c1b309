//! Cold-cache reads against the replicated store

use super::test_utils::{fast_policy, leaf, memory_api};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uprtcl::cache::{EntrySource, LocalCache, StoreEntrySource};
use uprtcl::entry::{Entry, EntryType};
use uprtcl::{Address, VcError};

/// Store-backed source that counts fetches and takes a while to answer
struct SlowCountingSource {
    inner: StoreEntrySource,
    fetches: AtomicUsize,
}

#[async_trait]
impl EntrySource for SlowCountingSource {
    async fn fetch_entry(&self, id: &Address) -> Result<Entry, VcError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.fetch_entry(id).await
    }
}

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    let api = memory_api("alice");
    let data = leaf(&api, "shared").await;
    let commit = api
        .create_commit(vec![], &data, "shared", "alice", 1)
        .await
        .unwrap();

    let source = Arc::new(SlowCountingSource {
        inner: StoreEntrySource::new(api.store().clone(), api.registry().clone(), fast_policy()),
        fetches: AtomicUsize::new(0),
    });
    let cache = LocalCache::new(source.clone());

    let results = join_all((0..16).map(|_| cache.get_commit(&commit))).await;
    for result in results {
        assert_eq!(result.unwrap().id, commit);
    }
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    // Served from the arena afterwards.
    cache.get_commit(&commit).await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_is_shared_and_not_cached() {
    let api = memory_api("alice");
    let source = Arc::new(SlowCountingSource {
        inner: StoreEntrySource::new(
            api.store().clone(),
            api.registry().clone(),
            uprtcl::consistency::ReadPolicy::single(),
        ),
        fetches: AtomicUsize::new(0),
    });
    let cache = LocalCache::new(source.clone());
    let missing = Address::from("0badc0de");

    let results = join_all((0..4).map(|_| cache.get_cached_entry(&missing, &EntryType::ALL))).await;
    for result in results {
        assert_eq!(result.unwrap_err(), VcError::NotFound(missing.clone()));
    }
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert!(!cache.contains(&missing));
}

#[tokio::test]
async fn test_type_mismatch_is_reported() {
    let api = memory_api("alice");
    let data = leaf(&api, "not a commit").await;
    let err = api.cache().get_commit(&data).await.unwrap_err();
    assert!(matches!(
        err,
        VcError::UnexpectedEntryType {
            found: EntryType::Content,
            ..
        }
    ));
}

#[tokio::test]
async fn test_perspectives_of_context_in_insertion_order() {
    let api = memory_api("alice");
    let context = api.create_context(1).await.unwrap();
    let names = ["one", "two", "three"];
    for name in names {
        api.create_perspective(name, Some(&context)).await.unwrap();
    }
    let cached: Vec<String> = api
        .cache()
        .perspectives_of(&context)
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(cached, names);
}
