/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::assembler::MergeStrategy;
use crate::error::Error;
use crate::registry::SessionRegistry;
use crate::runtime::scheduler::Scheduler;
use crate::storage::{MergeCapability, StorageBackend};
use crate::types::UploadSummary;
use crate::Config;

/// Chunked upload client.
///
/// The client owns the registry of in-progress uploads. Clones share it, uploads initiated
/// through one client are not visible to another.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. scheduler, session registry, config
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
    pub(crate) registry: SessionRegistry,
    pub(crate) scheduler: Scheduler,
}

impl Handle {
    pub(crate) fn storage(&self) -> &Arc<dyn StorageBackend> {
        self.config.storage()
    }

    /// The merge strategy to assemble uploads with.
    ///
    /// Follows the backend's capability unless overridden in the config, in which case a compose
    /// fan-in never exceeds what the backend accepts.
    pub(crate) fn merge_strategy(&self) -> MergeStrategy {
        let capability = self.storage().merge_capability();
        match (self.config.merge_strategy(), capability) {
            (
                Some(MergeStrategy::BatchedCompose { fan_in }),
                MergeCapability::Compose { max_sources },
            ) => MergeStrategy::BatchedCompose {
                fan_in: (*fan_in).min(max_sources),
            },
            (Some(strategy), _) => *strategy,
            (None, capability) => MergeStrategy::from(capability),
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        let open = self.registry.len();
        if open > 0 {
            // staged data of abandoned uploads stays in storage
            tracing::debug!("client dropped with {open} uploads still open");
        }
    }
}

impl Client {
    /// Creates a new client from a config.
    pub fn new(config: Config) -> Client {
        let scheduler = Scheduler::new(config.concurrency().clone());
        let handle = Arc::new(Handle {
            config,
            registry: SessionRegistry::new(),
            scheduler,
        });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Start a new chunked upload for a target key.
    ///
    /// Constructs a fluent builder for the
    /// [`InitiateUpload`](crate::operation::initiate_upload::builders::InitiateUploadFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// async fn start(client: &chunked_upload::Client) -> Result<(), chunked_upload::error::Error> {
    ///     let upload = client
    ///         .initiate_upload()
    ///         .target("videos/launch.mp4")
    ///         .send()
    ///         .await?;
    ///     println!("upload id: {}", upload.upload_id());
    ///     Ok(())
    /// }
    /// ```
    pub fn initiate_upload(
        &self,
    ) -> crate::operation::initiate_upload::builders::InitiateUploadFluentBuilder {
        crate::operation::initiate_upload::builders::InitiateUploadFluentBuilder::new(
            self.handle.clone(),
        )
    }

    /// Stage one part of an upload.
    ///
    /// Uploading the same part number again replaces the previously staged bytes.
    ///
    /// Constructs a fluent builder for the
    /// [`UploadPart`](crate::operation::upload_part::builders::UploadPartFluentBuilder) operation.
    pub fn upload_part(&self) -> crate::operation::upload_part::builders::UploadPartFluentBuilder {
        crate::operation::upload_part::builders::UploadPartFluentBuilder::new(self.handle.clone())
    }

    /// Assemble the staged parts of an upload into its target.
    ///
    /// The upload is finalized whether or not assembly succeeds, and its staged data is removed
    /// in both cases.
    ///
    /// Constructs a fluent builder for the
    /// [`CompleteUpload`](crate::operation::complete_upload::builders::CompleteUploadFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chunked_upload::types::UploadId;
    ///
    /// async fn finish(
    ///     client: &chunked_upload::Client,
    ///     upload_id: UploadId,
    /// ) -> Result<(), chunked_upload::error::Error> {
    ///     let completed = client
    ///         .complete_upload()
    ///         .upload_id(upload_id)
    ///         .send()
    ///         .await?;
    ///     println!("wrote {} bytes to {}", completed.size(), completed.target());
    ///     Ok(())
    /// }
    /// ```
    pub fn complete_upload(
        &self,
    ) -> crate::operation::complete_upload::builders::CompleteUploadFluentBuilder {
        crate::operation::complete_upload::builders::CompleteUploadFluentBuilder::new(
            self.handle.clone(),
        )
    }

    /// Discard an upload and everything staged for it.
    ///
    /// Constructs a fluent builder for the
    /// [`AbortUpload`](crate::operation::abort_upload::builders::AbortUploadFluentBuilder) operation.
    pub fn abort_upload(&self) -> crate::operation::abort_upload::builders::AbortUploadFluentBuilder {
        crate::operation::abort_upload::builders::AbortUploadFluentBuilder::new(self.handle.clone())
    }

    /// List the parts staged so far for an upload.
    ///
    /// Constructs a fluent builder for the
    /// [`ListParts`](crate::operation::list_parts::builders::ListPartsFluentBuilder) operation.
    pub fn list_parts(&self) -> crate::operation::list_parts::builders::ListPartsFluentBuilder {
        crate::operation::list_parts::builders::ListPartsFluentBuilder::new(self.handle.clone())
    }

    /// Every upload that has been initiated but not yet completed or aborted, oldest first.
    ///
    /// Uploads never expire on their own. A supervisor can use this listing to abort uploads
    /// that have been abandoned.
    pub fn list_uploads(&self) -> Result<Vec<UploadSummary>, Error> {
        self.handle.registry.list()
    }
}
