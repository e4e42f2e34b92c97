/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Types for starting a chunked upload
pub mod initiate_upload;

/// Types for staging a single part
pub mod upload_part;

/// Types for assembling an upload into its target
pub mod complete_upload;

/// Types for discarding an upload
pub mod abort_upload;

/// Types for listing the staged parts of an upload
pub mod list_parts;

/// Fail with `InputInvalid` when a required builder field is missing.
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T, crate::error::Error> {
    value.ok_or_else(|| crate::error::invalid_input(format!("`{field}` is required")))
}
