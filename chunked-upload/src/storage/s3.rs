/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Amazon S3 implementation of the StorageBackend trait.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use futures_util::StreamExt;
use tracing::Instrument;

use crate::error::{self, Error};
use crate::storage::{MergeCapability, ObjectInfo, ObjectStream, StorageBackend};

/// Maximum number of parts that a single S3 multipart upload supports
const MAX_PARTS: usize = 10_000;

/// Amazon S3 storage backend.
///
/// S3 has no native compose call. Composition is a multipart upload of the target whose parts
/// are server side copies (`UploadPartCopy`) of the sources, so up to 10,000 sources can be
/// merged per call.
///
/// NOTE: S3 requires every part but the last of a multipart upload to be at least 5 MiB.
/// Uploads through this backend must use parts of at least that size.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    /// Create a backend storing objects in `bucket`.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// The bucket objects are stored in
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn copy_source(&self, key: &str) -> String {
        copy_source(&self.bucket, key)
    }

    async fn upload_copies(
        &self,
        target: &str,
        upload_id: &str,
        sources: &[String],
    ) -> Result<Vec<CompletedPart>, Error> {
        let mut parts = Vec::with_capacity(sources.len());
        for (idx, source) in sources.iter().enumerate() {
            let part_number = idx as i32 + 1;
            let resp = self
                .client
                .upload_part_copy()
                .bucket(&self.bucket)
                .key(target)
                .upload_id(upload_id)
                .part_number(part_number)
                .copy_source(self.copy_source(source))
                .send()
                .instrument(tracing::debug_span!("send-upload-part-copy", part_number))
                .await
                .map_err(|err| sdk_error("compose", source, err))?;

            let e_tag = resp
                .copy_part_result()
                .and_then(|result| result.e_tag())
                .map(str::to_owned);
            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(e_tag)
                    .build(),
            );
        }
        Ok(parts)
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn merge_capability(&self) -> MergeCapability {
        MergeCapability::Compose {
            max_sources: MAX_PARTS,
        }
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<ObjectInfo, Error> {
        let size = content.len() as u64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(size as i64)
            .body(ByteStream::from(content))
            .send()
            .instrument(tracing::debug_span!("send-put-object", key))
            .await
            .map_err(|err| sdk_error("put", key, err))?;
        Ok(ObjectInfo::new(key, size))
    }

    async fn get(&self, key: &str) -> Result<ObjectStream, Error> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-get-object", key))
            .await
            .map_err(|err| match err.as_service_error() {
                Some(GetObjectError::NoSuchKey(_)) => error::object_not_found("get", key),
                _ => sdk_error("get", key, err),
            })?;

        let key = key.to_owned();
        let body = futures_util::stream::unfold(Some(resp.body), move |body| {
            let key = key.clone();
            async move {
                let mut body = body?;
                match body.next().await? {
                    Ok(chunk) => Some((Ok(chunk), Some(body))),
                    // stop after the first error
                    Err(err) => Some((Err(error::backend_io("get", &key, err)), None)),
                }
            }
        });
        Ok(body.boxed())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-delete-object", key))
            .await
            .map_err(|err| sdk_error("delete", key, err))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, Error> {
        let mut objects = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(next_token.take())
                .send()
                .instrument(tracing::debug_span!("send-list-objects-v2", prefix))
                .await
                .map_err(|err| sdk_error("list", prefix, err))?;

            objects.extend(resp.contents().iter().filter_map(|object| {
                let key = object.key()?;
                let size = object.size().unwrap_or_default().max(0) as u64;
                Some(ObjectInfo::new(key, size))
            }));

            let is_truncated = resp.is_truncated().unwrap_or(false);
            match resp.next_continuation_token() {
                Some(token) if is_truncated => next_token = Some(token.to_owned()),
                _ => break,
            }
        }
        objects.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(objects)
    }

    async fn compose(&self, target: &str, sources: &[String]) -> Result<(), Error> {
        if sources.len() > MAX_PARTS {
            return Err(error::backend_io(
                "compose",
                target,
                format!("{} sources exceed the fan-in limit of {MAX_PARTS}", sources.len()),
            ));
        }

        let mpu = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(target)
            .send()
            .instrument(tracing::debug_span!("send-create-multipart-upload"))
            .await
            .map_err(|err| sdk_error("compose", target, err))?;
        let upload_id = mpu
            .upload_id()
            .ok_or_else(|| {
                error::backend_io("compose", target, "CreateMultipartUpload returned no upload id")
            })?
            .to_owned();
        tracing::trace!("compose into {target} started with upload id {upload_id}");
        let pending = PendingCompose {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            target: target.to_owned(),
            upload_id: upload_id.clone(),
            armed: true,
        };

        let parts = match self.upload_copies(target, &upload_id, sources).await {
            Ok(parts) => parts,
            Err(err) => {
                pending.abort().await;
                return Err(err);
            }
        };

        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(target)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .instrument(tracing::debug_span!("send-complete-multipart-upload"))
            .await;
        if let Err(err) = completed {
            pending.abort().await;
            return Err(sdk_error("compose", target, err));
        }
        pending.disarm();
        Ok(())
    }

    async fn copy_or_rename(&self, source: &str, destination: &str) -> Result<(), Error> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(destination)
            .copy_source(self.copy_source(source))
            .send()
            .instrument(tracing::debug_span!("send-copy-object", destination))
            .await
            .map_err(|err| sdk_error("copy_or_rename", source, err))?;
        // the source is staged data and gets removed with the rest of the namespace
        Ok(())
    }
}

/// `CopySource` value for `key`, percent-encoded segment by segment.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{bucket}/{}", encoded.join("/"))
}

/// A multipart upload started by a compose that has not yet been completed.
///
/// Dropping it while armed (e.g. the compose future was cancelled) aborts the multipart upload
/// on a background task, copied parts are otherwise invisible to `list` and never cleaned up.
#[must_use]
struct PendingCompose {
    client: aws_sdk_s3::Client,
    bucket: String,
    target: String,
    upload_id: String,
    armed: bool,
}

impl PendingCompose {
    fn disarm(mut self) {
        self.armed = false;
    }

    async fn abort(mut self) {
        self.armed = false;
        abort_multipart_upload(&self.client, &self.bucket, &self.target, &self.upload_id).await;
    }
}

impl Drop for PendingCompose {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                "no runtime to abort multipart upload {} for {}",
                self.upload_id,
                self.target
            );
            return;
        };
        tracing::debug!(
            "compose into {} dropped, aborting multipart upload {}",
            self.target,
            self.upload_id
        );
        let client = self.client.clone();
        let bucket = std::mem::take(&mut self.bucket);
        let target = std::mem::take(&mut self.target);
        let upload_id = std::mem::take(&mut self.upload_id);
        runtime.spawn(async move {
            abort_multipart_upload(&client, &bucket, &target, &upload_id).await;
        });
    }
}

/// Best effort, failures are logged.
async fn abort_multipart_upload(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    target: &str,
    upload_id: &str,
) {
    let result = client
        .abort_multipart_upload()
        .bucket(bucket)
        .key(target)
        .upload_id(upload_id)
        .send()
        .instrument(tracing::debug_span!("send-abort-multipart-upload"))
        .await;
    if let Err(err) = result {
        tracing::warn!(
            "failed to abort multipart upload {upload_id} for {target}: {}",
            DisplayErrorContext(&err)
        );
    }
}

/// Map an SDK error, treating the "not found" family of codes as [`ErrorKind::NotFound`].
///
/// [`ErrorKind::NotFound`]: crate::error::ErrorKind::NotFound
fn sdk_error<E, R>(operation: &'static str, key: &str, err: SdkError<E, R>) -> Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    match err.code() {
        Some("NotFound" | "NoSuchKey" | "NoSuchUpload") => {
            error::object_not_found(operation, key)
        }
        _ => error::backend_io(operation, key, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::read_to_bytes;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
    use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
    use aws_sdk_s3::operation::get_object::GetObjectOutput;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::operation::upload_part_copy::{UploadPartCopyError, UploadPartCopyOutput};
    use aws_sdk_s3::types::error::NoSuchKey;
    use aws_sdk_s3::types::{CopyPartResult, Object};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};
    use aws_smithy_runtime::test_util::capture_test_logs::capture_test_logs;
    use std::time::Duration;

    #[tokio::test]
    async fn test_compose_copies_sources_in_order() {
        let (_guard, _rx) = capture_test_logs();
        let create_mpu =
            mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
                CreateMultipartUploadOutput::builder()
                    .upload_id("compose-upload")
                    .build()
            });

        let copy_rules: Vec<_> = (1..=3)
            .map(|part_number: i32| {
                mock!(aws_sdk_s3::Client::upload_part_copy)
                    .match_requests(move |r| {
                        r.part_number() == Some(part_number)
                            && r.copy_source()
                                == Some(format!("test-bucket/staging/id/parts/{part_number}").as_str())
                            && r.upload_id() == Some("compose-upload")
                    })
                    .then_output(move || {
                        UploadPartCopyOutput::builder()
                            .copy_part_result(
                                CopyPartResult::builder()
                                    .e_tag(format!("etag-{part_number}"))
                                    .build(),
                            )
                            .build()
                    })
            })
            .collect();

        let complete_mpu = mock!(aws_sdk_s3::Client::complete_multipart_upload)
            .match_requests(|r| {
                let parts = r
                    .multipart_upload()
                    .map(|mpu| mpu.parts().to_vec())
                    .unwrap_or_default();
                let etags: Vec<_> = parts.iter().filter_map(|p| p.e_tag()).collect();
                r.key() == Some("video.mp4") && etags == ["etag-1", "etag-2", "etag-3"]
            })
            .then_output(|| CompleteMultipartUploadOutput::builder().build());

        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[
                &create_mpu,
                &copy_rules[0],
                &copy_rules[1],
                &copy_rules[2],
                &complete_mpu
            ]
        );

        let storage = S3Storage::new(client, "test-bucket");
        let sources: Vec<String> = (1..=3).map(|n| format!("staging/id/parts/{n}")).collect();
        storage.compose("video.mp4", &sources).await.unwrap();

        assert_eq!(1, create_mpu.num_calls());
        assert_eq!(1, complete_mpu.num_calls());
        assert!(copy_rules.iter().all(|rule| rule.num_calls() == 1));
    }

    #[tokio::test]
    async fn test_compose_failure_aborts_multipart_upload() {
        let (_guard, _rx) = capture_test_logs();
        let create_mpu =
            mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
                CreateMultipartUploadOutput::builder()
                    .upload_id("compose-upload")
                    .build()
            });
        let copy_fails = mock!(aws_sdk_s3::Client::upload_part_copy)
            .then_error(|| {
                UploadPartCopyError::generic(ErrorMetadata::builder().code("InternalError").build())
            });
        let abort_mpu = mock!(aws_sdk_s3::Client::abort_multipart_upload)
            .match_requests(|r| r.upload_id() == Some("compose-upload"))
            .then_output(|| {
                aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadOutput::builder()
                    .build()
            });

        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&create_mpu, &copy_fails, &abort_mpu]
        );

        let storage = S3Storage::new(client, "test-bucket");
        let err = storage
            .compose("target", &["a".to_owned(), "b".to_owned()])
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::BackendIo, err.kind());
        assert_eq!(1, abort_mpu.num_calls());
    }

    #[tokio::test]
    async fn test_dropped_compose_aborts_multipart_upload() {
        let (_guard, _rx) = capture_test_logs();
        let abort_mpu = mock!(aws_sdk_s3::Client::abort_multipart_upload)
            .match_requests(|r| {
                r.upload_id() == Some("compose-upload") && r.key() == Some("target")
            })
            .then_output(|| {
                aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadOutput::builder()
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&abort_mpu]);

        let pending = PendingCompose {
            client,
            bucket: "test-bucket".to_owned(),
            target: "target".to_owned(),
            upload_id: "compose-upload".to_owned(),
            armed: true,
        };
        drop(pending);

        tokio::time::timeout(Duration::from_secs(5), async {
            while abort_mpu.num_calls() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("abort issued in the background");
        assert_eq!(1, abort_mpu.num_calls());
    }

    #[tokio::test]
    async fn test_completed_compose_is_not_aborted() {
        let abort_mpu = mock!(aws_sdk_s3::Client::abort_multipart_upload).then_output(|| {
            aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadOutput::builder()
                .build()
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&abort_mpu]);

        let pending = PendingCompose {
            client,
            bucket: "test-bucket".to_owned(),
            target: "target".to_owned(),
            upload_id: "compose-upload".to_owned(),
            armed: true,
        };
        pending.disarm();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(0, abort_mpu.num_calls());
    }

    #[test]
    fn test_copy_source_encodes_key_segments() {
        assert_eq!(
            "bucket/staging/id/parts/0000000001",
            copy_source("bucket", "staging/id/parts/0000000001")
        );
        assert_eq!(
            "bucket/my%20uploads/a%2Bb/parts/1",
            copy_source("bucket", "my uploads/a+b/parts/1")
        );
    }

    #[tokio::test]
    async fn test_list_follows_continuation_tokens() {
        let first_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("p/2").size(2).build())
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("p/1").size(1).build())
                    .is_truncated(false)
                    .build()
            });

        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&first_page, &second_page]);
        let storage = S3Storage::new(client, "test-bucket");

        let listed = storage.list("p/").await.unwrap();
        assert_eq!(
            vec![ObjectInfo::new("p/1", 1), ObjectInfo::new("p/2", 2)],
            listed
        );
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let get_object = mock!(aws_sdk_s3::Client::get_object)
            .then_error(|| GetObjectError::NoSuchKey(NoSuchKey::builder().build()));
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get_object]);
        let storage = S3Storage::new(client, "test-bucket");

        let err = storage.get("missing").await.err().unwrap();
        assert_eq!(&ErrorKind::NotFound, err.kind());
    }

    #[tokio::test]
    async fn test_get_streams_body() {
        let get_object = mock!(aws_sdk_s3::Client::get_object).then_output(|| {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(b"staged bytes"))
                .build()
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get_object]);
        let storage = S3Storage::new(client, "test-bucket");

        let data = read_to_bytes(&storage, "key").await.unwrap();
        assert_eq!(Bytes::from_static(b"staged bytes"), data);
    }
}
