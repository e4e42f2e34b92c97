/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use aws_sdk_s3::error::DisplayErrorContext;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Operation builders
pub mod builders;

mod input;
pub use input::{CompleteUploadInput, CompleteUploadInputBuilder};

mod output;
pub use output::CompleteUploadOutput;

use crate::assembler::{self, Assembled};
use crate::cleanup::{self, Intermediates};
use crate::client::Handle;
use crate::error::{self, Error};
use crate::registry::{SessionState, UploadSession};
use crate::stager;

/// Operation struct for assembling an upload into its target
#[derive(Clone, Default, Debug)]
pub(crate) struct CompleteUpload;

impl CompleteUpload {
    /// Execute a single `CompleteUpload` operation
    ///
    /// The session is taken out of the registry before anything else happens, so a concurrent
    /// complete or abort of the same upload observes `NotFound`. Assembly and cleanup run on a
    /// separate task and finish even if the returned future is dropped.
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        input: CompleteUploadInput,
    ) -> Result<CompleteUploadOutput, Error> {
        let session = handle
            .registry
            .pop(&input.upload_id, SessionState::Completing)?;
        tracing::debug!("completing upload {} into {}", session.id, session.target);

        let task = tokio::spawn(
            finalize(handle, session, input.cancellation_token).instrument(tracing::Span::current()),
        );
        task.await?
    }
}

async fn finalize(
    handle: Arc<Handle>,
    mut session: UploadSession,
    cancellation_token: Option<CancellationToken>,
) -> Result<CompleteUploadOutput, Error> {
    let mut intermediates = Intermediates::new();
    let assembly = assemble_staged(&handle, &session, &mut intermediates);
    let result = match &cancellation_token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(error::operation_cancelled()),
            result = assembly => result,
        },
        None => assembly.await,
    };

    let cleanup =
        cleanup::cleanup_session(handle.storage().as_ref(), &session.staging, &intermediates).await;

    match result {
        Ok(assembled) => {
            session.state = SessionState::Completed;
            tracing::debug!(
                state = ?session.state,
                "upload {} completed: {} parts, {} bytes",
                session.id,
                assembled.parts,
                assembled.size
            );
            Ok(CompleteUploadOutput {
                upload_id: session.id,
                target: session.target,
                size: assembled.size,
                parts: assembled.parts,
                rounds: assembled.rounds,
                cleanup,
            })
        }
        Err(err) => {
            session.state = SessionState::Aborted;
            tracing::debug!(
                state = ?session.state,
                "upload {} failed and was discarded: {}",
                session.id,
                DisplayErrorContext(&err)
            );
            Err(err)
        }
    }
}

async fn assemble_staged(
    handle: &Handle,
    session: &UploadSession,
    intermediates: &mut Intermediates,
) -> Result<Assembled, Error> {
    let storage = handle.storage();
    let parts = stager::list_staged_parts(storage.as_ref(), &session.staging)
        .await
        .map_err(error::assembly_failed)?;
    if parts.is_empty() {
        return Err(error::invalid_input(format!(
            "upload `{}` has no staged parts",
            session.id
        )));
    }

    assembler::assemble(
        storage,
        &handle.scheduler,
        handle.merge_strategy(),
        session,
        &parts,
        intermediates,
    )
    .await
    .map_err(error::assembly_failed)
}
