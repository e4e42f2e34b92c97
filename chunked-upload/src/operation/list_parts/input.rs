/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error::Error;
use crate::operation::required;
use crate::types::UploadId;

/// Input type for listing the staged parts of an upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ListPartsInput {
    /// The upload to list.
    pub upload_id: UploadId,
}

/// A builder for [`ListPartsInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct ListPartsInputBuilder {
    pub(crate) upload_id: Option<UploadId>,
}

impl ListPartsInputBuilder {
    /// The upload to list.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.upload_id = Some(input.into());
        self
    }

    /// Consumes the builder and constructs a [`ListPartsInput`]
    pub fn build(self) -> Result<ListPartsInput, Error> {
        Ok(ListPartsInput {
            upload_id: required(self.upload_id, "upload_id")?,
        })
    }
}
