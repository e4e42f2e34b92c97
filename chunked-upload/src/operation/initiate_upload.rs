/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Component, Path};
use std::sync::Arc;

/// Operation builders
pub mod builders;

mod input;
pub use input::{InitiateUploadInput, InitiateUploadInputBuilder};

mod output;
pub use output::InitiateUploadOutput;

use crate::cleanup;
use crate::error::{self, Error};
use crate::registry::UploadSession;
use crate::stager::StagingNamespace;
use crate::types::UploadId;

/// Operation struct for starting a chunked upload
#[derive(Clone, Default, Debug)]
pub(crate) struct InitiateUpload;

impl InitiateUpload {
    /// Execute a single `InitiateUpload` operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: InitiateUploadInput,
    ) -> Result<InitiateUploadOutput, Error> {
        let target = normalize_target(&input.target, handle.config.staging_prefix())?;

        let upload_id = UploadId::generate();
        let staging = StagingNamespace::new(handle.config.staging_prefix(), &upload_id);
        handle.storage().create_namespace(staging.root()).await?;

        let session = UploadSession::new(upload_id.clone(), target.clone(), staging);
        let root = session.staging.root().to_owned();
        if let Err(err) = handle.registry.insert(session) {
            // nothing has been staged yet, only the namespace needs to go
            cleanup::discard_namespace(handle.storage().as_ref(), &root).await;
            return Err(err);
        }

        tracing::debug!("initiated upload {upload_id} for {target}");
        Ok(InitiateUploadOutput { upload_id, target })
    }
}

/// Normalize a target key, rejecting keys that escape the storage root, name a directory or
/// point into the staging area.
fn normalize_target(target: &str, staging_prefix: &str) -> Result<String, Error> {
    let trimmed = target.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(error::invalid_path("target must not be empty"));
    }
    if trimmed.ends_with('/') {
        return Err(error::invalid_path(format!(
            "target `{target}` names a directory"
        )));
    }

    let cleaned = path_clean::clean(Path::new(trimmed));
    let valid = cleaned
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    let normalized = match cleaned.to_str() {
        Some(normalized) if valid => normalized.to_owned(),
        _ => {
            return Err(error::invalid_path(format!(
                "target `{target}` is not a valid object key"
            )))
        }
    };

    if normalized == staging_prefix || normalized.starts_with(&format!("{staging_prefix}/")) {
        return Err(error::invalid_path(format!(
            "target `{target}` is inside the staging prefix `{staging_prefix}`"
        )));
    }
    Ok(normalized)
}
