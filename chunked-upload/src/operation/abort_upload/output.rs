/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::cleanup::CleanupReport;
use crate::types::UploadId;

/// Output type for discarding an upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct AbortUploadOutput {
    pub(crate) upload_id: UploadId,
    pub(crate) cleanup: CleanupReport,
}

impl AbortUploadOutput {
    /// The discarded upload
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// What was removed from staging
    pub fn cleanup(&self) -> &CleanupReport {
        &self.cleanup
    }
}
