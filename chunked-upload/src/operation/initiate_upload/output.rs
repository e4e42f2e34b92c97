/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::UploadId;

/// Output type for starting a chunked upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct InitiateUploadOutput {
    pub(crate) upload_id: UploadId,
    pub(crate) target: String,
}

impl InitiateUploadOutput {
    /// Identifier to pass to every subsequent call for this upload
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// The normalized key of the object the upload will produce
    pub fn target(&self) -> &str {
        &self.target
    }
}
