/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tracing::Instrument;

/// Operation builders
pub mod builders;

mod input;
pub use input::{AbortUploadInput, AbortUploadInputBuilder};

mod output;
pub use output::AbortUploadOutput;

use crate::cleanup::{self, Intermediates};
use crate::error::Error;
use crate::registry::SessionState;

/// Operation struct for discarding an upload
#[derive(Clone, Default, Debug)]
pub(crate) struct AbortUpload;

impl AbortUpload {
    /// Execute a single `AbortUpload` operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: AbortUploadInput,
    ) -> Result<AbortUploadOutput, Error> {
        let session = handle
            .registry
            .pop(&input.upload_id, SessionState::Aborted)?;
        tracing::debug!("aborting upload {} for {}", session.id, session.target);

        // cleanup finishes even if the caller stops waiting
        let task = tokio::spawn(
            async move {
                let cleanup = cleanup::cleanup_session(
                    handle.storage().as_ref(),
                    &session.staging,
                    &Intermediates::new(),
                )
                .await;
                AbortUploadOutput {
                    upload_id: session.id,
                    cleanup,
                }
            }
            .instrument(tracing::Span::current()),
        );
        Ok(task.await?)
    }
}
