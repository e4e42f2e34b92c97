/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;

use crate::error::Error;
use crate::storage::StorageBackend;
use crate::types::{BlockId, PartHandle, PartNumber, UploadId};

const PARTS_DIR: &str = "parts/";
const INTERMEDIATE_DIR: &str = "intermediate/";

/// Storage prefix exclusively owned by one upload session.
///
/// ```text
/// {staging_prefix}/{upload_id}/parts/{block_id}
/// {staging_prefix}/{upload_id}/intermediate/{round}-{index}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagingNamespace {
    // always ends with `/`
    root: String,
}

impl StagingNamespace {
    pub(crate) fn new(staging_prefix: &str, upload_id: &UploadId) -> Self {
        let staging_prefix = staging_prefix.trim_matches('/');
        let root = if staging_prefix.is_empty() {
            format!("{upload_id}/")
        } else {
            format!("{staging_prefix}/{upload_id}/")
        };
        Self { root }
    }

    /// Prefix of every object belonging to the session
    pub(crate) fn root(&self) -> &str {
        &self.root
    }

    pub(crate) fn parts_prefix(&self) -> String {
        format!("{}{PARTS_DIR}", self.root)
    }

    pub(crate) fn part_key(&self, block_id: &BlockId) -> String {
        format!("{}{PARTS_DIR}{block_id}", self.root)
    }

    pub(crate) fn intermediate_key(&self, round: usize, index: usize) -> String {
        format!("{}{INTERMEDIATE_DIR}{round}-{index}", self.root)
    }

    /// Recover the block id from the key of a staged part.
    pub(crate) fn parse_part_key(&self, key: &str) -> Option<BlockId> {
        key.strip_prefix(self.root.as_str())?
            .strip_prefix(PARTS_DIR)?
            .parse()
            .ok()
    }
}

/// Durably write the payload of a part, replacing whatever was staged for the same number.
pub(crate) async fn stage_part(
    storage: &dyn StorageBackend,
    staging: &StagingNamespace,
    part_number: PartNumber,
    data: Bytes,
) -> Result<PartHandle, Error> {
    let key = staging.part_key(&BlockId::from(part_number));
    let info = storage.put(&key, data).await?;
    tracing::trace!("staged part {part_number} at {key} ({} bytes)", info.size());
    Ok(PartHandle::new(part_number, info.key(), info.size()))
}

/// Every part currently staged in the namespace, in ascending part number order.
pub(crate) async fn list_staged_parts(
    storage: &dyn StorageBackend,
    staging: &StagingNamespace,
) -> Result<Vec<PartHandle>, Error> {
    let listed = storage.list(&staging.parts_prefix()).await?;
    let mut parts: Vec<PartHandle> = listed
        .into_iter()
        .filter_map(|object| match staging.parse_part_key(object.key()) {
            Some(block_id) => Some(PartHandle::new(
                block_id.part_number(),
                object.key(),
                object.size(),
            )),
            None => {
                tracing::debug!("ignoring unrecognized object {} in staging", object.key());
                None
            }
        })
        .collect();
    parts.sort_by_key(PartHandle::part_number);
    Ok(parts)
}
