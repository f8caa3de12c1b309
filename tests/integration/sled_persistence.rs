//! Durable replica: history survives reopening the store

use super::test_utils::{leaf, sled_api};
use tempfile::TempDir;
use uprtcl::entry::Entry;
use uprtcl::perspective::NewPerspective;

#[tokio::test]
async fn test_history_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let (context, perspective, second) = {
        let (api, replica) = sled_api(&dir, "alice");
        let context = api.create_context(10).await.unwrap();
        let d1 = leaf(&api, "D1").await;
        let first = api
            .create_commit(vec![], &d1, "Commit message", "alice", 10)
            .await
            .unwrap();
        let perspective = api
            .create_perspective_with(
                NewPerspective::named("master")
                    .with_head(first)
                    .in_context(context.clone()),
            )
            .await
            .unwrap();
        let d2 = leaf(&api, "D2").await;
        let second = api
            .create_commit_in_perspective(&perspective, &d2, "second")
            .await
            .unwrap();
        replica.flush().unwrap();
        (context, perspective, second)
    };

    let (reopened, _replica) = sled_api(&dir, "bob");
    assert_eq!(
        reopened.get_perspective_head(&perspective).await.unwrap(),
        second
    );
    assert_eq!(reopened.get_commit_history(&second).await.unwrap().len(), 2);

    let listed = reopened.get_context_perspectives(&context).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].payload.name, "master");

    match reopened.get_entry(&perspective).await.unwrap() {
        Entry::Perspective(p) => {
            assert_eq!(p.creator_id, "alice");
            assert_eq!(p.head_commit_id, second);
        }
        other => panic!("expected a perspective, got {:?}", other.entry_type()),
    }
}

#[tokio::test]
async fn test_content_links_round_trip_on_disk() {
    let dir = TempDir::new().unwrap();
    let (api, _replica) = sled_api(&dir, "alice");
    let child = leaf(&api, "child").await;
    let parent = api
        .put_content(&uprtcl::content::Content::leaf("parent").with_link("child", child.clone()))
        .await
        .unwrap();

    let stored = api.store().get_content(&parent).await.unwrap();
    assert_eq!(stored.payload, b"parent");
    assert_eq!(stored.link("child").unwrap().address, child);
}

#[tokio::test]
async fn test_open_from_config_persists_after_flush() {
    let dir = TempDir::new().unwrap();
    let mut config = uprtcl::config::UprtclConfig::default();
    config.storage.backend = uprtcl::config::StorageBackend::Sled;
    config.storage.path = Some(dir.path().join("store"));
    config.agent.creator_id = "alice".to_string();

    let bootstrap = {
        let api = uprtcl::VersionControlApi::open(&config).unwrap();
        let d1 = leaf(&api, "D1").await;
        let bootstrap = api
            .create_context_perspective_and_commit("master", &d1, "init")
            .await
            .unwrap();
        api.flush().unwrap();
        bootstrap
    };

    let reopened = uprtcl::VersionControlApi::open(&config).unwrap();
    assert_eq!(reopened.creator_id(), "alice");
    assert_eq!(
        reopened.checkout(&bootstrap.perspective_id).await.unwrap().id,
        bootstrap.commit_id
    );
}

#[test]
fn test_memory_backend_flush_is_a_no_op() {
    let mut config = uprtcl::config::UprtclConfig::default();
    config.storage.backend = uprtcl::config::StorageBackend::Memory;
    let api = uprtcl::VersionControlApi::open(&config).unwrap();
    api.flush().unwrap();
}
