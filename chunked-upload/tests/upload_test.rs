/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::Bytes;
use chunked_upload::error::ErrorKind;
use chunked_upload::storage::{read_to_bytes, InMemoryStorage, MergeCapability, StorageBackend};
use chunked_upload::types::{ConcurrencyMode, UploadId};
use chunked_upload::{Client, Config, MergeStrategy};
use test_common::{init_tracing, Op, RecordingStorage};

type Recorded = Arc<RecordingStorage<InMemoryStorage>>;

fn recorded(capability: MergeCapability) -> Recorded {
    Arc::new(RecordingStorage::new(InMemoryStorage::with_capability(
        capability,
    )))
}

fn client_for(storage: Recorded) -> Client {
    let config = Config::builder().set_storage(storage).build().unwrap();
    Client::new(config)
}

async fn upload_parts(client: &Client, upload_id: &UploadId, parts: &[(u32, &'static str)]) {
    for (part_number, data) in parts {
        client
            .upload_part()
            .upload_id(upload_id.clone())
            .part_number(*part_number)
            .body(Bytes::from_static(data.as_bytes()))
            .send()
            .await
            .unwrap();
    }
}

async fn staged_keys(storage: &Recorded) -> Vec<String> {
    storage
        .inner()
        .keys()
        .await
        .into_iter()
        .filter(|k| k.starts_with(".chunked-uploads/"))
        .collect()
}

#[tokio::test]
async fn test_out_of_order_parts_assemble_in_part_order() {
    init_tracing();
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());

    let upload = client
        .initiate_upload()
        .target("video.mp4")
        .send()
        .await
        .unwrap();
    upload_parts(&client, upload.upload_id(), &[(2, "B"), (1, "A"), (3, "C")]).await;

    let completed = client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();

    assert_eq!("video.mp4", completed.target());
    assert_eq!(3, completed.size());
    assert_eq!(3, completed.parts());
    assert_eq!(0, completed.rounds());
    assert_eq!(3, completed.cleanup().deleted());
    assert_eq!(
        Bytes::from("ABC"),
        read_to_bytes(storage.as_ref(), "video.mp4").await.unwrap()
    );
    assert!(staged_keys(&storage).await.is_empty());
    assert!(storage.inner().namespaces().await.is_empty());
    assert!(client.list_uploads().unwrap().is_empty());
}

#[tokio::test]
async fn test_batched_compose_rounds_with_fan_in_two() {
    init_tracing();
    let storage = recorded(MergeCapability::Compose { max_sources: 2 });
    let client = client_for(storage.clone());

    let upload = client.initiate_upload().target("out").send().await.unwrap();
    let id = upload.upload_id().clone();
    upload_parts(
        &client,
        &id,
        &[(1, "1"), (2, "2"), (3, "3"), (4, "4"), (5, "5")],
    )
    .await;

    let completed = client
        .complete_upload()
        .upload_id(id.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(3, completed.rounds());
    assert_eq!(
        Bytes::from("12345"),
        read_to_bytes(storage.as_ref(), "out").await.unwrap()
    );

    let root = format!(".chunked-uploads/{id}/");
    let part = |n: u32| format!("{root}parts/{n:010}");
    let intermediate = |name: &str| format!("{root}intermediate/{name}");
    let mut expected = vec![
        (intermediate("1-0"), vec![part(1), part(2)]),
        (intermediate("1-1"), vec![part(3), part(4)]),
        (intermediate("2-0"), vec![intermediate("1-0"), intermediate("1-1")]),
        ("out".to_owned(), vec![intermediate("2-0"), part(5)]),
    ];
    let mut actual = storage.compose_calls();
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);

    assert!(storage.calls_of(Op::CopyOrRename).is_empty());
    assert!(staged_keys(&storage).await.is_empty());
}

fn expected_rounds(parts: usize, fan_in: usize) -> usize {
    let mut rounds = 0;
    let mut reach = 1;
    while reach < parts {
        reach *= fan_in;
        rounds += 1;
    }
    rounds
}

#[tokio::test]
async fn test_round_count_is_log_fan_in_of_parts() {
    for fan_in in [2usize, 3, 4, 32] {
        for parts in [1usize, 2, 3, 4, 7, 9, 16, 17, 33] {
            let storage = recorded(MergeCapability::Compose {
                max_sources: fan_in,
            });
            let client = client_for(storage.clone());
            let upload = client.initiate_upload().target("t").send().await.unwrap();

            let mut expected = Vec::new();
            for n in 1..=parts as u32 {
                let data = format!("<{n}>");
                expected.extend_from_slice(data.as_bytes());
                client
                    .upload_part()
                    .upload_id(upload.upload_id().clone())
                    .part_number(n)
                    .body(data)
                    .send()
                    .await
                    .unwrap();
            }

            let completed = client
                .complete_upload()
                .upload_id(upload.upload_id().clone())
                .send()
                .await
                .unwrap();
            assert_eq!(
                expected_rounds(parts, fan_in),
                completed.rounds(),
                "parts={parts} fan_in={fan_in}"
            );
            if fan_in >= parts && parts > 1 {
                assert_eq!(1, completed.rounds());
            }
            assert_eq!(
                Bytes::from(expected),
                read_to_bytes(storage.as_ref(), "t").await.unwrap()
            );
            assert!(staged_keys(&storage).await.is_empty());
        }
    }
}

#[tokio::test]
async fn test_random_upload_order_gives_same_bytes() {
    for capability in [
        MergeCapability::Concatenate,
        MergeCapability::Compose { max_sources: 3 },
        MergeCapability::BlockCommit,
    ] {
        let storage = recorded(capability);
        let client = client_for(storage.clone());
        let upload = client
            .initiate_upload()
            .target("shuffled.bin")
            .send()
            .await
            .unwrap();

        // sparse part numbers, including ones that sort differently as plain strings
        let mut numbers: Vec<u32> = vec![1, 2, 3, 9, 10, 11, 20, 100, 1_000, 65_536];
        let expected: Vec<u8> = numbers
            .iter()
            .flat_map(|n| format!("[{n}]").into_bytes())
            .collect();
        fastrand::shuffle(&mut numbers);

        let mut tasks = tokio::task::JoinSet::new();
        for n in numbers {
            let client = client.clone();
            let upload_id = upload.upload_id().clone();
            tasks.spawn(async move {
                client
                    .upload_part()
                    .upload_id(upload_id)
                    .part_number(n)
                    .body(format!("[{n}]"))
                    .send()
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        client
            .complete_upload()
            .upload_id(upload.upload_id().clone())
            .send()
            .await
            .unwrap();
        assert_eq!(
            Bytes::from(expected),
            read_to_bytes(storage.as_ref(), "shuffled.bin").await.unwrap(),
            "{capability:?}"
        );
    }
}

#[tokio::test]
async fn test_block_commit_is_a_single_ordered_call() {
    let storage = recorded(MergeCapability::BlockCommit);
    let client = client_for(storage.clone());
    let upload = client.initiate_upload().target("blob").send().await.unwrap();
    let id = upload.upload_id().clone();
    upload_parts(&client, &id, &[(10, "J"), (9, "I"), (100, "Z")]).await;

    let completed = client.complete_upload().upload_id(id.clone()).send().await.unwrap();
    assert_eq!(0, completed.rounds());

    let commits = storage.calls_of(Op::CommitBlockList);
    assert_eq!(1, commits.len());
    let root = format!(".chunked-uploads/{id}/parts/");
    assert_eq!(
        vec![
            format!("{root}0000000009"),
            format!("{root}0000000010"),
            format!("{root}0000000100"),
        ],
        commits[0].sources
    );
    assert!(storage.calls_of(Op::Compose).is_empty());
    assert_eq!(
        Bytes::from("IJZ"),
        read_to_bytes(storage.as_ref(), "blob").await.unwrap()
    );
    assert!(staged_keys(&storage).await.is_empty());
}

#[tokio::test]
async fn test_restaged_part_replaces_previous_payload() {
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());
    let upload = client.initiate_upload().target("t").send().await.unwrap();
    upload_parts(&client, upload.upload_id(), &[(1, "first"), (2, "-"), (1, "second")]).await;

    let listed = client
        .list_parts()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();
    assert_eq!(2, listed.parts().len());
    assert_eq!(7, listed.total_size());

    client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();
    assert_eq!(
        Bytes::from("second-"),
        read_to_bytes(storage.as_ref(), "t").await.unwrap()
    );
}

#[tokio::test]
async fn test_complete_without_parts_is_invalid_and_finalizes() {
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());
    let upload = client.initiate_upload().target("empty").send().await.unwrap();

    let err = client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());

    assert!(storage.inner().keys().await.is_empty());
    assert!(storage.inner().namespaces().await.is_empty());
    assert!(client.list_uploads().unwrap().is_empty());

    let err = client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
}

#[tokio::test]
async fn test_second_complete_is_not_found() {
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());
    let upload = client.initiate_upload().target("t").send().await.unwrap();
    upload_parts(&client, upload.upload_id(), &[(1, "x")]).await;

    client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();
    let err = client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());

    let err = client
        .upload_part()
        .upload_id(upload.upload_id().clone())
        .part_number(2)
        .body("late")
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
}

#[tokio::test]
async fn test_abort_removes_staged_data() {
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());
    let upload = client.initiate_upload().target("t").send().await.unwrap();
    upload_parts(&client, upload.upload_id(), &[(1, "a"), (2, "b")]).await;
    assert_eq!(2, staged_keys(&storage).await.len());

    let aborted = client
        .abort_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();
    assert_eq!(2, aborted.cleanup().deleted());
    assert!(aborted.cleanup().is_clean());
    assert!(storage.inner().keys().await.is_empty());
    assert!(storage.inner().namespaces().await.is_empty());

    let err = client
        .upload_part()
        .upload_id(upload.upload_id().clone())
        .part_number(3)
        .body("c")
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());

    let err = client
        .abort_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_complete_and_abort_race_has_one_winner() {
    for _ in 0..20 {
        let storage = recorded(MergeCapability::Compose { max_sources: 2 });
        let client = client_for(storage.clone());
        let upload = client.initiate_upload().target("raced").send().await.unwrap();
        upload_parts(&client, upload.upload_id(), &[(1, "a"), (2, "b"), (3, "c")]).await;

        let complete = client.complete_upload().upload_id(upload.upload_id().clone());
        let abort = client.abort_upload().upload_id(upload.upload_id().clone());
        let (completed, aborted) = tokio::join!(
            tokio::spawn(complete.send()),
            tokio::spawn(abort.send())
        );
        let completed = completed.unwrap();
        let aborted = aborted.unwrap();

        match (&completed, &aborted) {
            (Ok(_), Err(err)) => {
                assert_eq!(&ErrorKind::NotFound, err.kind());
                assert_eq!(
                    Bytes::from("abc"),
                    read_to_bytes(storage.as_ref(), "raced").await.unwrap()
                );
            }
            (Err(err), Ok(_)) => {
                assert_eq!(&ErrorKind::NotFound, err.kind());
                assert!(storage.inner().keys().await.is_empty());
            }
            other => panic!("expected exactly one winner, got {other:?}"),
        }

        // nothing was deleted twice
        let mut deleted: Vec<_> = storage
            .calls_of(Op::Delete)
            .into_iter()
            .map(|c| c.key)
            .collect();
        let total = deleted.len();
        deleted.sort();
        deleted.dedup();
        assert_eq!(total, deleted.len());
        assert!(staged_keys(&storage).await.is_empty());
    }
}

#[tokio::test]
async fn test_invalid_requests() {
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());

    for target in ["", "../escape", "dir/", ".chunked-uploads/sneaky"] {
        let err = client.initiate_upload().target(target).send().await.unwrap_err();
        assert_eq!(&ErrorKind::InvalidPath, err.kind(), "{target:?}");
    }
    assert!(storage.calls_of(Op::CreateNamespace).is_empty());

    let err = client.initiate_upload().send().await.unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());

    let upload = client.initiate_upload().target("/t").send().await.unwrap();
    assert_eq!("t", upload.target());

    let err = client
        .upload_part()
        .upload_id(upload.upload_id().clone())
        .part_number(0)
        .body("zero")
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());

    let err = client
        .upload_part()
        .upload_id("no-such-upload")
        .part_number(1)
        .body("x")
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
    assert!(storage.calls_of(Op::Put).is_empty());
}

#[tokio::test]
async fn test_list_uploads_tracks_open_sessions() {
    let storage = recorded(MergeCapability::Concatenate);
    let client = client_for(storage.clone());

    let a = client.initiate_upload().target("a").send().await.unwrap();
    let b = client.initiate_upload().target("b").send().await.unwrap();
    assert_ne!(a.upload_id(), b.upload_id());

    let mut targets: Vec<_> = client
        .list_uploads()
        .unwrap()
        .iter()
        .map(|u| u.target().to_owned())
        .collect();
    targets.sort();
    assert_eq!(vec!["a", "b"], targets);

    client
        .abort_upload()
        .upload_id(a.upload_id().clone())
        .send()
        .await
        .unwrap();
    let open = client.list_uploads().unwrap();
    assert_eq!(1, open.len());
    assert_eq!(b.upload_id(), open[0].upload_id());
}

#[tokio::test]
async fn test_fan_in_override_lowers_compose_batches() {
    let storage = Arc::new(RecordingStorage::new(InMemoryStorage::with_capability(
        MergeCapability::Compose { max_sources: 1_000 },
    )));
    let config = Config::builder()
        .set_storage(storage.clone() as Arc<dyn StorageBackend>)
        .merge_strategy(MergeStrategy::BatchedCompose { fan_in: 3 })
        .concurrency(ConcurrencyMode::Explicit(1))
        .build()
        .unwrap();
    let client = Client::new(config);

    let upload = client.initiate_upload().target("t").send().await.unwrap();
    upload_parts(
        &client,
        upload.upload_id(),
        &[(1, "a"), (2, "b"), (3, "c"), (4, "d")],
    )
    .await;
    let completed = client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();

    assert_eq!(2, completed.rounds());
    assert!(storage.compose_calls().iter().all(|(_, s)| s.len() <= 3));
    assert_eq!(
        Bytes::from("abcd"),
        read_to_bytes(storage.as_ref(), "t").await.unwrap()
    );
}
