/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;
use std::time::Duration;

use chunked_upload::error::ErrorKind;
use chunked_upload::storage::FilesystemStorage;
use chunked_upload::{Client, Config, MergeStrategy};
use tempfile::tempdir;
use test_common::{Op, RecordingStorage};

#[tokio::test]
async fn test_filesystem_upload_end_to_end() {
    test_common::init_tracing();
    let temp_dir = tempdir().unwrap();
    let storage = FilesystemStorage::new(temp_dir.path()).await.unwrap();
    let client = Client::new(Config::builder().storage(storage).build().unwrap());

    let upload = client
        .initiate_upload()
        .target("media/video.mp4")
        .send()
        .await
        .unwrap();
    let staging_dir = temp_dir
        .path()
        .join("objects")
        .join(".chunked-uploads")
        .join(upload.upload_id().as_str());
    assert!(staging_dir.is_dir());

    for (n, data) in [(2, "B"), (1, "A"), (3, "C")] {
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
    assert_eq!(3, completed.size());

    let target = temp_dir.path().join("objects").join("media").join("video.mp4");
    assert_eq!("ABC", std::fs::read_to_string(target).unwrap());
    assert!(!staging_dir.exists());
    assert_eq!(
        0,
        std::fs::read_dir(temp_dir.path().join("tmp")).unwrap().count()
    );
}

#[tokio::test]
async fn test_filesystem_batched_compose() {
    let temp_dir = tempdir().unwrap();
    let storage = FilesystemStorage::new(temp_dir.path()).await.unwrap();
    let config = Config::builder()
        .storage(storage)
        .merge_strategy(MergeStrategy::BatchedCompose { fan_in: 2 })
        .build()
        .unwrap();
    let client = Client::new(config);

    let upload = client.initiate_upload().target("out.bin").send().await.unwrap();
    for n in 1..=5u32 {
        client
            .upload_part()
            .upload_id(upload.upload_id().clone())
            .part_number(n)
            .body(n.to_string())
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
    assert_eq!(3, completed.rounds());
    assert_eq!(
        "12345",
        std::fs::read_to_string(temp_dir.path().join("objects").join("out.bin")).unwrap()
    );
    assert!(!temp_dir
        .path()
        .join("objects")
        .join(".chunked-uploads")
        .join(upload.upload_id().as_str())
        .exists());
}

#[tokio::test]
async fn test_filesystem_abort() {
    let temp_dir = tempdir().unwrap();
    let storage = FilesystemStorage::new(temp_dir.path()).await.unwrap();
    let client = Client::new(Config::builder().storage(storage).build().unwrap());

    let upload = client.initiate_upload().target("t").send().await.unwrap();
    client
        .upload_part()
        .upload_id(upload.upload_id().clone())
        .part_number(1)
        .body("data")
        .send()
        .await
        .unwrap();

    let aborted = client
        .abort_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();
    assert_eq!(1, aborted.cleanup().deleted());
    assert!(!temp_dir.path().join("objects").join("t").exists());

    let err = client
        .complete_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
}

#[tokio::test]
async fn test_part_written_after_abort_leaves_no_staging_dir() {
    let temp_dir = tempdir().unwrap();
    let storage = Arc::new(RecordingStorage::new(
        FilesystemStorage::new(temp_dir.path()).await.unwrap(),
    ));
    storage.delay(Op::Put, Duration::from_millis(200));
    let client = Client::new(Config::builder().set_storage(storage.clone()).build().unwrap());

    let upload = client.initiate_upload().target("t").send().await.unwrap();
    let staging_dir = temp_dir
        .path()
        .join("objects")
        .join(".chunked-uploads")
        .join(upload.upload_id().as_str());

    let late_part = tokio::spawn(
        client
            .upload_part()
            .upload_id(upload.upload_id().clone())
            .part_number(1)
            .body("late")
            .send(),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    client
        .abort_upload()
        .upload_id(upload.upload_id().clone())
        .send()
        .await
        .unwrap();
    assert!(!staging_dir.exists());

    let err = late_part.await.unwrap().unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
    assert_eq!(1, storage.calls_of(Op::Put).len());
    assert!(!staging_dir.exists());
}
