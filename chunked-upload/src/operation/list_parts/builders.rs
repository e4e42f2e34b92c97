/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use super::{ListPartsInputBuilder, ListPartsOutput};
use crate::types::UploadId;

/// Fluent builder for listing the staged parts of an upload
#[derive(Debug)]
pub struct ListPartsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: ListPartsInputBuilder,
}

impl ListPartsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: std::default::Default::default(),
        }
    }

    /// List the staged parts
    #[tracing::instrument(skip_all, level = "debug", name = "list-parts")]
    pub async fn send(self) -> Result<ListPartsOutput, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::list_parts::ListParts::orchestrate(self.handle, input).await
    }

    /// The upload to list.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.inner = self.inner.upload_id(input);
        self
    }
}
