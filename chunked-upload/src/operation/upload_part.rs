/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use aws_sdk_s3::error::DisplayErrorContext;

/// Operation builders
pub mod builders;

mod input;
pub use input::{UploadPartInput, UploadPartInputBuilder};

use crate::cleanup;
use crate::error::{self, Error, ErrorKind};
use crate::stager;
use crate::types::{BlockId, PartHandle, PartNumber};

/// Operation struct for staging a single part
#[derive(Clone, Default, Debug)]
pub(crate) struct UploadPart;

impl UploadPart {
    /// Execute a single `UploadPart` operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: UploadPartInput,
    ) -> Result<PartHandle, Error> {
        let part_number = PartNumber::new(input.part_number)?;
        let session = handle.registry.get(&input.upload_id)?;

        let staged = stager::stage_part(
            handle.storage().as_ref(),
            &session.staging,
            part_number,
            input.body,
        );
        let part = match input.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(error::operation_cancelled()),
                result = staged => result,
            },
            None => staged.await,
        }?;

        // the upload may have been finalized while the part was being written
        if let Err(err) = handle.registry.get(&session.id) {
            let key = session.staging.part_key(&BlockId::from(part_number));
            match handle.storage().delete(&key).await {
                Err(delete_err) if delete_err.kind() != &ErrorKind::NotFound => {
                    tracing::warn!(
                        "failed to remove orphaned part {key}: {}",
                        DisplayErrorContext(&delete_err)
                    )
                }
                _ => {}
            }
            // the write may have recreated the namespace after the upload was cleaned up
            cleanup::discard_namespace(handle.storage().as_ref(), session.staging.root()).await;
            return Err(err);
        }
        Ok(part)
    }
}
