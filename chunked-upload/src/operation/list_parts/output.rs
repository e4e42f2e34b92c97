/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::PartHandle;

/// Output type for listing the staged parts of an upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ListPartsOutput {
    pub(crate) parts: Vec<PartHandle>,
}

impl ListPartsOutput {
    /// Staged parts in ascending part number order
    pub fn parts(&self) -> &[PartHandle] {
        &self.parts
    }

    /// Combined size of the staged parts in bytes
    pub fn total_size(&self) -> u64 {
        self.parts.iter().map(PartHandle::size).sum()
    }
}
