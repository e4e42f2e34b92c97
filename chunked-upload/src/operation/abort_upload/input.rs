/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error::Error;
use crate::operation::required;
use crate::types::UploadId;

/// Input type for discarding an upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct AbortUploadInput {
    /// The upload to discard.
    pub upload_id: UploadId,
}

impl AbortUploadInput {
    /// Creates a new builder-style object to manufacture [`AbortUploadInput`].
    pub fn builder() -> AbortUploadInputBuilder {
        AbortUploadInputBuilder::default()
    }

    /// The upload to discard.
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }
}

/// A builder for [`AbortUploadInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct AbortUploadInputBuilder {
    pub(crate) upload_id: Option<UploadId>,
}

impl AbortUploadInputBuilder {
    /// The upload to discard.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.upload_id = Some(input.into());
        self
    }

    /// The upload to discard.
    pub fn get_upload_id(&self) -> &Option<UploadId> {
        &self.upload_id
    }

    /// Consumes the builder and constructs an [`AbortUploadInput`]
    pub fn build(self) -> Result<AbortUploadInput, Error> {
        Ok(AbortUploadInput {
            upload_id: required(self.upload_id, "upload_id")?,
        })
    }
}
