/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::operation::required;
use crate::types::UploadId;

/// Input type for staging a single part
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct UploadPartInput {
    /// The upload the part belongs to.
    pub upload_id: UploadId,

    /// 1-based position of the part in the assembled object.
    pub part_number: u32,

    /// The part payload.
    pub body: Bytes,

    /// Token that aborts the in-flight write when cancelled.
    pub cancellation_token: Option<CancellationToken>,
}

impl UploadPartInput {
    /// Creates a new builder-style object to manufacture [`UploadPartInput`].
    pub fn builder() -> UploadPartInputBuilder {
        UploadPartInputBuilder::default()
    }

    /// The upload the part belongs to.
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// 1-based position of the part in the assembled object.
    pub fn part_number(&self) -> u32 {
        self.part_number
    }

    /// The part payload.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// A builder for [`UploadPartInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct UploadPartInputBuilder {
    pub(crate) upload_id: Option<UploadId>,
    pub(crate) part_number: Option<u32>,
    pub(crate) body: Option<Bytes>,
    pub(crate) cancellation_token: Option<CancellationToken>,
}

impl UploadPartInputBuilder {
    /// The upload the part belongs to.
    /// Required.
    pub fn upload_id(mut self, input: impl Into<UploadId>) -> Self {
        self.upload_id = Some(input.into());
        self
    }

    /// The upload the part belongs to.
    pub fn get_upload_id(&self) -> &Option<UploadId> {
        &self.upload_id
    }

    /// 1-based position of the part in the assembled object. Need not be contiguous.
    /// Required.
    pub fn part_number(mut self, input: u32) -> Self {
        self.part_number = Some(input);
        self
    }

    /// 1-based position of the part in the assembled object.
    pub fn get_part_number(&self) -> Option<u32> {
        self.part_number
    }

    /// The part payload.
    /// Required.
    pub fn body(mut self, input: impl Into<Bytes>) -> Self {
        self.body = Some(input.into());
        self
    }

    /// Token that aborts the in-flight write when cancelled. The upload stays open.
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.cancellation_token = Some(input);
        self
    }

    /// Consumes the builder and constructs an [`UploadPartInput`]
    pub fn build(self) -> Result<UploadPartInput, Error> {
        Ok(UploadPartInput {
            upload_id: required(self.upload_id, "upload_id")?,
            part_number: required(self.part_number, "part_number")?,
            body: required(self.body, "body")?,
            cancellation_token: self.cancellation_token,
        })
    }
}
