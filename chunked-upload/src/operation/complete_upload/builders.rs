/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{CompleteUploadInputBuilder, CompleteUploadOutput};
use crate::types::UploadId;

/// Fluent builder for assembling an upload into its target
#[derive(Debug)]
pub struct CompleteUploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: CompleteUploadInputBuilder,
}

impl CompleteUploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: std::default::Default::default(),
        }
    }

    /// Assemble the upload
    #[tracing::instrument(skip_all, level = "debug", name = "complete-upload", fields(
        upload_id = self.inner.upload_id.as_ref().map(UploadId::as_str).unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<CompleteUploadOutput, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::complete_upload::CompleteUpload::orchestrate(self.handle, input).await
    }

    /// The upload to complete.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.inner = self.inner.upload_id(input);
        self
    }

    /// The upload to complete.
    pub fn set_upload_id(mut self, input: Option<UploadId>) -> Self {
        self.inner = self.inner.set_upload_id(input);
        self
    }

    /// The upload to complete.
    pub fn get_upload_id(&self) -> &Option<UploadId> {
        self.inner.get_upload_id()
    }

    /// Token that stops the assembly when cancelled.
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.inner = self.inner.cancellation_token(input);
        self
    }
}

impl CompleteUploadInputBuilder {
    /// Assemble the upload using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<CompleteUploadOutput, crate::error::Error> {
        let mut fluent_builder = client.complete_upload();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
