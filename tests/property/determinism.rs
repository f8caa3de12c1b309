//! Property-based tests for determinism guarantees

use proptest::prelude::*;
use std::sync::Arc;
use uprtcl::commit::CommitRecord;
use uprtcl::content::{Content, ContentStore, Link};
use uprtcl::entry::codec::{decode_record, encode_record, record_address};
use uprtcl::entry::Record;
use uprtcl::provenance::AcceptAll;
use uprtcl::store::MemoryReplica;
use uprtcl::{Address, VersionControlApi};

fn content_strategy() -> impl Strategy<Value = Content> {
    (
        any::<Vec<u8>>(),
        prop::collection::vec(("[a-z]{1,8}", "[0-9a-f]{64}"), 0..4),
    )
        .prop_map(|(payload, links)| {
            Content::new(
                payload,
                links
                    .into_iter()
                    .map(|(name, address)| Link::new(name, address))
                    .collect(),
            )
        })
}

/// Raw payloads: arbitrary bytes, the empty payload, and bytes posing as typed records
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(Vec::new()),
        prop::collection::vec(any::<u8>(), 0..512),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(|tail| {
            let mut bytes = b"UPRTCL\x00\x01".to_vec();
            bytes.extend(tail);
            bytes
        }),
    ]
}

proptest! {
    /// Decoding an encoded content record yields the same content and the same address
    #[test]
    fn content_record_survives_codec(content in content_strategy()) {
        let record = Record::Content(content.clone());
        let bytes = encode_record(&record).unwrap();
        let decoded = decode_record(&bytes).unwrap().unwrap();
        prop_assert_eq!(&decoded, &record);
        prop_assert_eq!(record_address(&decoded).unwrap(), record_address(&record).unwrap());
    }

    /// Commit ids depend on every field of the commit
    #[test]
    fn commit_id_changes_with_message(
        message in ".{0,32}",
        other in ".{0,32}",
        timestamp in any::<u64>(),
    ) {
        let data = Address::from("d".repeat(64));
        let a = CommitRecord::new(data.clone(), vec![], message.clone(), "alice", timestamp);
        let b = CommitRecord::new(data, vec![], other.clone(), "alice", timestamp);
        let id_a = record_address(&Record::Commit(a)).unwrap();
        let id_b = record_address(&Record::Commit(b)).unwrap();
        prop_assert_eq!(id_a == id_b, message == other);
    }
}

/// Creating the same commit twice through the API yields the same id
#[test]
fn test_create_commit_idempotence_property() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(any::<Vec<u8>>(), ".{0,16}", "[a-z]{1,8}", any::<u64>()),
            |(payload, message, creator, timestamp)| {
                rt.block_on(async {
                    let api = VersionControlApi::new(
                        Arc::new(MemoryReplica::new()),
                        Arc::new(AcceptAll),
                        creator.clone(),
                        uprtcl::consistency::ReadPolicy::single(),
                    );
                    let data = api.put_content(&Content::leaf(payload)).await.unwrap();
                    let first = api
                        .create_commit(vec![], &data, &message, &creator, timestamp)
                        .await
                        .unwrap();
                    let second = api
                        .create_commit(vec![], &data, &message, &creator, timestamp)
                        .await
                        .unwrap();
                    assert_eq!(first, second);

                    let child = api
                        .create_commit(vec![first.clone()], &data, &message, &creator, timestamp)
                        .await
                        .unwrap();
                    let history = api.get_commit_history(&child).await.unwrap();
                    assert_eq!(history[1].id, first);
                });
                Ok(())
            },
        )
        .unwrap();
}

/// Every byte payload reads back unchanged from the address `put` returned
#[test]
fn test_raw_payload_round_trips_through_store() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&payload_strategy(), |payload| {
            rt.block_on(async {
                let store = ContentStore::new(Arc::new(MemoryReplica::new()), Arc::new(AcceptAll));
                let address = store.put(&payload).await.unwrap();
                assert_eq!(store.get(&address).await.unwrap(), payload);
                assert_eq!(store.put(&payload).await.unwrap(), address);
            });
            Ok(())
        })
        .unwrap();
}
