/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

/// Operation builders
pub mod builders;

mod input;
pub use input::{ListPartsInput, ListPartsInputBuilder};

mod output;
pub use output::ListPartsOutput;

use crate::error::Error;
use crate::stager;

/// Operation struct for listing the staged parts of an upload
#[derive(Clone, Default, Debug)]
pub(crate) struct ListParts;

impl ListParts {
    /// Execute a single `ListParts` operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: ListPartsInput,
    ) -> Result<ListPartsOutput, Error> {
        let session = handle.registry.get(&input.upload_id)?;
        let parts = stager::list_staged_parts(handle.storage().as_ref(), &session.staging).await?;
        Ok(ListPartsOutput { parts })
    }
}
