/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::assembler::MergeStrategy;
use crate::error::{self, Error};
use crate::storage::StorageBackend;
use crate::types::ConcurrencyMode;

pub(crate) mod loader;

/// Default prefix under which every upload gets its staging namespace
pub const DEFAULT_STAGING_PREFIX: &str = ".chunked-uploads";

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    storage: Arc<dyn StorageBackend>,
    staging_prefix: String,
    concurrency: ConcurrencyMode,
    merge_strategy: Option<MergeStrategy>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The storage backend parts are staged in and assembled by
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Prefix of the staging namespaces, without a trailing `/`
    pub fn staging_prefix(&self) -> &str {
        &self.staging_prefix
    }

    /// Returns the concurrency mode used for backend requests issued while assembling.
    pub fn concurrency(&self) -> &ConcurrencyMode {
        &self.concurrency
    }

    /// The merge strategy override, if any.
    ///
    /// When unset the strategy follows the backend's [`merge_capability`].
    ///
    /// [`merge_capability`]: crate::storage::StorageBackend::merge_capability
    pub fn merge_strategy(&self) -> Option<&MergeStrategy> {
        self.merge_strategy.as_ref()
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    storage: Option<Arc<dyn StorageBackend>>,
    staging_prefix: Option<String>,
    concurrency: ConcurrencyMode,
    merge_strategy: Option<MergeStrategy>,
}

impl Builder {
    /// Set the storage backend to use.
    pub fn storage(self, storage: impl StorageBackend + 'static) -> Self {
        self.set_storage(Arc::new(storage))
    }

    /// Set a shared storage backend to use.
    pub fn set_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Prefix under which staging namespaces are created.
    ///
    /// Targets inside this prefix are rejected. Default is [`DEFAULT_STAGING_PREFIX`].
    pub fn staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.staging_prefix = Some(prefix.into());
        self
    }

    /// Set the concurrency mode this client should use.
    ///
    /// This bounds the number of compose requests in flight during one assembly round.
    /// Default is [ConcurrencyMode::Auto].
    pub fn concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency = mode;
        self
    }

    /// Override the merge strategy derived from the backend's capability.
    ///
    /// A compose fan-in larger than the backend supports is lowered to the backend's limit.
    /// A strategy the backend cannot carry out at all (e.g. block commit on a backend without
    /// block support) is rejected by [`build`](Self::build).
    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = Some(strategy);
        self
    }

    /// Consumes the builder and constructs a [`Config`]
    pub fn build(self) -> Result<Config, Error> {
        let storage = self
            .storage
            .ok_or_else(|| error::invalid_input("a storage backend must be set"))?;

        let staging_prefix = self
            .staging_prefix
            .as_deref()
            .unwrap_or(DEFAULT_STAGING_PREFIX)
            .trim_matches('/')
            .to_owned();
        if staging_prefix.is_empty() {
            return Err(error::invalid_input("staging prefix must not be empty"));
        }

        if let Some(strategy) = &self.merge_strategy {
            strategy.validate()?;
            let capability = storage.merge_capability();
            if !strategy.supported_by(capability) {
                return Err(error::invalid_input(format!(
                    "merge strategy {strategy:?} is not supported by a backend with {capability:?}"
                )));
            }
        }

        Ok(Config {
            storage,
            staging_prefix,
            concurrency: self.concurrency,
            merge_strategy: self.merge_strategy,
        })
    }
}
