/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use super::{InitiateUploadInputBuilder, InitiateUploadOutput};

/// Fluent builder for starting a chunked upload
#[derive(Debug)]
pub struct InitiateUploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: InitiateUploadInputBuilder,
}

impl InitiateUploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: std::default::Default::default(),
        }
    }

    /// Start the upload
    #[tracing::instrument(skip_all, level = "debug", name = "initiate-upload", fields(
        target = self.inner.target.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<InitiateUploadOutput, crate::error::Error> {
        let input = self.inner.build()?;
        crate::operation::initiate_upload::InitiateUpload::orchestrate(self.handle, input).await
    }

    /// Key of the object the upload will produce.
    /// Required.
    pub fn target(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.target(input);
        self
    }

    /// Key of the object the upload will produce.
    pub fn set_target(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_target(input);
        self
    }

    /// Key of the object the upload will produce.
    pub fn get_target(&self) -> &Option<String> {
        self.inner.get_target()
    }
}

impl InitiateUploadInputBuilder {
    /// Start the upload using the given client
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<InitiateUploadOutput, crate::error::Error> {
        let mut fluent_builder = client.initiate_upload();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
