/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use super::{AbortUploadInputBuilder, AbortUploadOutput};
use crate::types::UploadId;

/// Fluent builder for discarding an upload
#[derive(Debug)]
pub struct AbortUploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: AbortUploadInputBuilder,
}

impl AbortUploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: std::default::Default::default(),
        }
    }

    /// Discard the upload
    #[tracing::instrument(skip_all, level = "debug", name = "abort-upload", fields(
        upload_id = self.inner.upload_id.as_ref().map(UploadId::as_str).unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<AbortUploadOutput, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::abort_upload::AbortUpload::orchestrate(self.handle, input).await
    }

    /// The upload to discard.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.inner = self.inner.upload_id(input);
        self
    }

    /// The upload to discard.
    pub fn get_upload_id(&self) -> &Option<UploadId> {
        self.inner.get_upload_id()
    }
}

impl AbortUploadInputBuilder {
    /// Discard the upload using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<AbortUploadOutput, crate::error::Error> {
        let mut fluent_builder = client.abort_upload();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
