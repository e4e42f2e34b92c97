/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::operation::required;
use crate::types::UploadId;

/// Input type for assembling an upload into its target
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct CompleteUploadInput {
    /// The upload to complete.
    pub upload_id: UploadId,

    /// Token that stops the assembly when cancelled.
    pub cancellation_token: Option<CancellationToken>,
}

impl CompleteUploadInput {
    /// Creates a new builder-style object to manufacture [`CompleteUploadInput`].
    pub fn builder() -> CompleteUploadInputBuilder {
        CompleteUploadInputBuilder::default()
    }

    /// The upload to complete.
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// Token that stops the assembly when cancelled.
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation_token.as_ref()
    }
}

/// A builder for [`CompleteUploadInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct CompleteUploadInputBuilder {
    pub(crate) upload_id: Option<UploadId>,
    pub(crate) cancellation_token: Option<CancellationToken>,
}

impl CompleteUploadInputBuilder {
    /// The upload to complete.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.upload_id = Some(input.into());
        self
    }

    /// The upload to complete.
    pub fn set_upload_id(mut self, input: Option<UploadId>) -> Self {
        self.upload_id = input;
        self
    }

    /// The upload to complete.
    pub fn get_upload_id(&self) -> &Option<UploadId> {
        &self.upload_id
    }

    /// Token that stops the assembly when cancelled.
    ///
    /// A cancelled assembly fails with `OperationCancelled`. The upload is finalized and its
    /// staged data removed, exactly as for any other assembly failure.
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.cancellation_token = Some(input);
        self
    }

    /// Consumes the builder and constructs a [`CompleteUploadInput`]
    pub fn build(self) -> Result<CompleteUploadInput, Error> {
        Ok(CompleteUploadInput {
            upload_id: required(self.upload_id, "upload_id")?,
            cancellation_token: self.cancellation_token,
        })
    }
}
