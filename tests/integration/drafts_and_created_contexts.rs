//! Per-author drafts and the contexts an author created

use super::test_utils::{fast_policy, lagging_api, leaf, memory_api, peer_api};
use uprtcl::content::Content;
use uprtcl::Address;

#[tokio::test]
async fn test_draft_survives_until_committed() {
    let api = memory_api("alice");
    let d1 = leaf(&api, "D1").await;
    let bootstrap = api
        .create_context_perspective_and_commit("master", &d1, "init")
        .await
        .unwrap();
    let perspective = &bootstrap.perspective_id;

    let work = Content::leaf("work in progress").with_link("child", d1.clone());
    api.set_draft(perspective, Some(&work)).await.unwrap();
    assert_eq!(api.get_draft(perspective).await.unwrap(), Some(work.clone()));

    let data = api.put_content(&work).await.unwrap();
    api.create_commit_in_perspective(perspective, &data, "from draft")
        .await
        .unwrap();
    api.set_draft(perspective, None).await.unwrap();
    assert_eq!(api.get_draft(perspective).await.unwrap(), None);
}

#[tokio::test]
async fn test_drafts_stay_private_to_their_author() {
    let (alice, replica) = lagging_api("alice", 0, fast_policy());
    let bob = peer_api(replica, "bob");
    let entry = Address::from("a".repeat(64));

    alice
        .set_draft(&entry, Some(&Content::leaf("alice's")))
        .await
        .unwrap();
    bob.set_draft(&entry, Some(&Content::leaf("bob's"))).await.unwrap();

    assert_eq!(
        alice.get_draft(&entry).await.unwrap(),
        Some(Content::leaf("alice's"))
    );
    assert_eq!(
        bob.get_draft(&entry).await.unwrap(),
        Some(Content::leaf("bob's"))
    );
}

#[tokio::test]
async fn test_contexts_created_by_each_author() {
    let (alice, replica) = lagging_api("alice", 0, fast_policy());
    let bob = peer_api(replica, "bob");

    let first = alice.create_context(10).await.unwrap();
    let d1 = leaf(&alice, "D1").await;
    let bootstrap = alice
        .create_context_perspective_and_commit("master", &d1, "init")
        .await
        .unwrap();
    let bobs = bob.create_context(5).await.unwrap();

    let created: Vec<Address> = alice
        .contexts_created_by("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(created, vec![first, bootstrap.context_id]);

    let listed_by_peer = alice.contexts_created_by("bob").await.unwrap();
    assert_eq!(listed_by_peer.len(), 1);
    assert_eq!(listed_by_peer[0].id, bobs);
    assert_eq!(listed_by_peer[0].creator_id, "bob");
}
