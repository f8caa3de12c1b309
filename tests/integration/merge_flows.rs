//! Merging perspectives through the API

use super::test_utils::memory_api;
use uprtcl::content::Content;
use uprtcl::entry::Entry;
use uprtcl::merge::MergeOutcome;
use uprtcl::perspective::NewPerspective;
use uprtcl::{Address, VcError, VersionControlApi};

struct Branches {
    master: Address,
    develop: Address,
}

/// "master" and "develop" both pointing at a root commit holding `base`
async fn branches(api: &VersionControlApi, base: Content) -> Branches {
    let content = api.put_content(&base).await.unwrap();
    let root = api
        .create_commit(vec![], &content, "base", "alice", 1)
        .await
        .unwrap();
    let master = api
        .create_perspective_with(NewPerspective::named("master").with_head(root.clone()))
        .await
        .unwrap();
    let develop = api
        .create_perspective_with(NewPerspective::named("develop").with_head(root.clone()))
        .await
        .unwrap();
    Branches { master, develop }
}

async fn commit_on(api: &VersionControlApi, perspective: &Address, content: Content) -> Address {
    let data = api.put_content(&content).await.unwrap();
    api.create_commit_in_perspective(perspective, &data, "edit")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_fast_forward_returns_from_head() {
    let api = memory_api("alice");
    let b = branches(&api, Content::leaf("v1")).await;
    let ahead = commit_on(&api, &b.develop, Content::leaf("v2")).await;

    let outcome = api.merge(&b.develop, &b.master).await.unwrap();
    assert_eq!(outcome, MergeOutcome::FastForward(ahead.clone()));
    assert_eq!(api.get_perspective_head(&b.master).await.unwrap(), ahead);
    // No merge commit: the new head is develop's own commit.
    assert_eq!(
        api.get_commit_history(&ahead).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_merging_an_ancestor_is_up_to_date() {
    let api = memory_api("alice");
    let b = branches(&api, Content::leaf("v1")).await;
    let ahead = commit_on(&api, &b.master, Content::leaf("v2")).await;

    let head = api.merge_branches(&b.develop, &b.master).await.unwrap();
    assert_eq!(head, ahead);
    assert_eq!(
        api.merge(&b.master, &b.master).await.unwrap(),
        MergeOutcome::UpToDate(ahead)
    );
}

#[tokio::test]
async fn test_disjoint_edits_produce_merge_commit() {
    let api = memory_api("alice");
    let a0 = api.put_content(&Content::leaf("a0")).await.unwrap();
    let b0 = api.put_content(&Content::leaf("b0")).await.unwrap();
    let a1 = api.put_content(&Content::leaf("a1")).await.unwrap();
    let b1 = api.put_content(&Content::leaf("b1")).await.unwrap();

    let b = branches(
        &api,
        Content::leaf("doc")
            .with_link("a", a0.clone())
            .with_link("b", b0.clone()),
    )
    .await;
    let to_head = commit_on(
        &api,
        &b.master,
        Content::leaf("doc").with_link("a", a1.clone()).with_link("b", b0),
    )
    .await;
    let from_head = commit_on(
        &api,
        &b.develop,
        Content::leaf("doc").with_link("a", a0).with_link("b", b1.clone()),
    )
    .await;

    let outcome = api.merge(&b.develop, &b.master).await.unwrap();
    let merged = match outcome {
        MergeOutcome::Merged(head) => head,
        other => panic!("expected a merge commit, got {:?}", other),
    };

    let commit = match api.get_entry(&merged).await.unwrap() {
        Entry::Commit(commit) => commit,
        other => panic!("expected a commit, got {:?}", other.entry_type()),
    };
    assert_eq!(commit.parent_ids, vec![to_head, from_head]);
    assert_eq!(commit.message, "merge develop into master");

    let content = api.get_content(&commit.content_id).await.unwrap();
    assert_eq!(content.link("a").unwrap().address, a1);
    assert_eq!(content.link("b").unwrap().address, b1);
}

#[tokio::test]
async fn test_overlapping_edits_conflict_at_path() {
    let api = memory_api("alice");
    let original = api.put_content(&Content::leaf("original")).await.unwrap();
    let mine = api.put_content(&Content::leaf("mine")).await.unwrap();
    let theirs = api.put_content(&Content::leaf("theirs")).await.unwrap();

    let b = branches(&api, Content::leaf("root").with_link("doc", original)).await;
    commit_on(&api, &b.master, Content::leaf("root").with_link("doc", mine)).await;
    commit_on(&api, &b.develop, Content::leaf("root").with_link("doc", theirs)).await;

    let err = api.merge(&b.develop, &b.master).await.unwrap_err();
    assert_eq!(
        err,
        VcError::MergeConflict {
            paths: vec!["/doc".to_string()]
        }
    );
}

#[tokio::test]
async fn test_unrelated_histories_are_rejected() {
    let api = memory_api("alice");
    let left = branches(&api, Content::leaf("left")).await;
    let right = branches(&api, Content::leaf("right")).await;

    let err = api.merge(&left.develop, &right.master).await.unwrap_err();
    assert_eq!(
        err,
        VcError::UnrelatedHistories {
            from: left.develop,
            to: right.master,
        }
    );
}
