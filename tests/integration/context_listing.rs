//! Perspectives grouped under contexts

use super::test_utils::{fast_policy, lagging_api, leaf, memory_api};
use uprtcl::consistency::read_until;
use uprtcl::perspective::NewPerspective;

#[tokio::test]
async fn test_perspectives_listed_in_creation_order() {
    let api = memory_api("alice");
    let context = api.create_context(1_000).await.unwrap();

    let master = api.create_perspective("master", Some(&context)).await.unwrap();
    let develop = api.create_perspective("develop", Some(&context)).await.unwrap();

    let listed = api.get_context_perspectives(&context).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|p| p.payload.name.as_str()).collect();
    assert_eq!(names, vec!["master", "develop"]);
    assert_eq!(listed[0].id, master);
    assert_eq!(listed[1].id, develop);
}

#[tokio::test]
async fn test_same_timestamp_yields_same_context() {
    let api = memory_api("alice");
    let a = api.create_context(7).await.unwrap();
    let b = api.create_context(7).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(api.contexts().address_of(7, 0).unwrap(), a);

    let other_creator = memory_api("bob");
    assert_ne!(other_creator.create_context(7).await.unwrap(), a);
}

#[tokio::test]
async fn test_moving_a_perspective_between_contexts() {
    let api = memory_api("alice");
    let first = api.create_context(1).await.unwrap();
    let second = api.create_context(2).await.unwrap();
    let feature = api.create_perspective("feature", Some(&first)).await.unwrap();

    api.update_perspective_context(&feature, &second).await.unwrap();

    assert!(api.get_context_perspectives(&first).await.unwrap().is_empty());
    let moved = api.get_context_perspectives(&second).await.unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].payload.context_id.as_ref(), Some(&second));
}

#[tokio::test]
async fn test_listing_converges_on_lagging_replica() {
    let (api, _replica) = lagging_api("alice", 2, fast_policy());
    let context = api.create_context(5).await.unwrap();
    let data = leaf(&api, "root").await;
    let creator = api.creator_id().to_string();
    let root = api
        .create_commit(vec![], &data, "root", &creator, 5)
        .await
        .unwrap();

    api.create_perspective_with(
        NewPerspective::named("master")
            .with_head(root.clone())
            .in_context(context.clone()),
    )
    .await
    .unwrap();
    api.create_perspective_with(
        NewPerspective::named("develop")
            .with_head(root)
            .in_context(context.clone()),
    )
    .await
    .unwrap();

    let listed = read_until(
        &fast_policy(),
        "context listing",
        || api.get_context_perspectives(&context),
        |listed| listed.len() == 2,
    )
    .await
    .unwrap();
    let names: Vec<&str> = listed.iter().map(|p| p.payload.name.as_str()).collect();
    assert_eq!(names, vec!["master", "develop"]);
}
