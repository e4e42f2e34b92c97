/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::UploadPartInputBuilder;
use crate::types::{PartHandle, UploadId};

/// Fluent builder for staging a single part
#[derive(Debug)]
pub struct UploadPartFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: UploadPartInputBuilder,
}

impl UploadPartFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: std::default::Default::default(),
        }
    }

    /// Stage the part
    #[tracing::instrument(skip_all, level = "debug", name = "upload-part", fields(
        upload_id = self.inner.upload_id.as_ref().map(UploadId::as_str).unwrap_or_default(),
        part_number = self.inner.part_number.unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<PartHandle, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::upload_part::UploadPart::orchestrate(self.handle, input).await
    }

    /// The upload the part belongs to.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.inner = self.inner.upload_id(input);
        self
    }

    /// The upload the part belongs to.
    pub fn get_upload_id(&self) -> &Option<UploadId> {
        self.inner.get_upload_id()
    }

    /// 1-based position of the part in the assembled object. Need not be contiguous.
    /// Required.
    pub fn part_number(mut self, input: u32) -> Self {
        self.inner = self.inner.part_number(input);
        self
    }

    /// 1-based position of the part in the assembled object.
    pub fn get_part_number(&self) -> Option<u32> {
        self.inner.get_part_number()
    }

    /// The part payload.
    /// Required.
    pub fn body(mut self, input: impl Into<Bytes>) -> Self {
        self.inner = self.inner.body(input);
        self
    }

    /// Token that aborts the in-flight write when cancelled. The upload stays open.
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.inner = self.inner.cancellation_token(input);
        self
    }
}

impl UploadPartInputBuilder {
    /// Stage the part using the given client
    pub async fn send_with(self, client: &crate::Client) -> Result<PartHandle, crate::error::Error> {
        let mut fluent_builder = client.upload_part();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
