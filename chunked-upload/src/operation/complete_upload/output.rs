/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::cleanup::CleanupReport;
use crate::types::UploadId;

/// Output type for assembling an upload into its target
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct CompleteUploadOutput {
    pub(crate) upload_id: UploadId,
    pub(crate) target: String,
    pub(crate) size: u64,
    pub(crate) parts: usize,
    pub(crate) rounds: usize,
    pub(crate) cleanup: CleanupReport,
}

impl CompleteUploadOutput {
    /// The completed upload
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// Key of the assembled object
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Size of the assembled object in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of parts the object was assembled from
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Number of compose rounds it took.
    ///
    /// Zero for backends that concatenate or commit block lists.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// What was removed from staging afterwards
    pub fn cleanup(&self) -> &CleanupReport {
        &self.cleanup
    }
}
