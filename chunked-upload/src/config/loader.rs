/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::assembler::MergeStrategy;
use crate::config::Builder;
use crate::error::{self, Error};
use crate::storage::S3Storage;
use crate::types::ConcurrencyMode;
use crate::Config;

/// Environment variable naming the bucket uploads are assembled in
pub const BUCKET_ENV_VAR: &str = "CHUNKED_UPLOAD_BUCKET";

/// Load an Amazon S3 backed [`Config`] from the environment.
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    bucket: Option<String>,
}

impl ConfigLoader {
    /// The bucket to stage parts in and assemble targets into.
    ///
    /// Default is the value of the `CHUNKED_UPLOAD_BUCKET` environment variable.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Prefix under which staging namespaces are created.
    pub fn staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.builder = self.builder.staging_prefix(prefix);
        self
    }

    /// Set the concurrency level this component is allowed to use.
    ///
    /// This sets the maximum number of concurrent in-flight requests.
    /// Default is [ConcurrencyMode::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.builder = self.builder.concurrency(concurrency);
        self
    }

    /// Override the merge strategy (e.g. a smaller compose fan-in).
    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.builder = self.builder.merge_strategy(strategy);
        self
    }

    /// Load the default configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the default values for each field will be provided.
    pub async fn load(self) -> Result<Config, Error> {
        let bucket = match self.bucket {
            Some(bucket) => bucket,
            None => std::env::var(BUCKET_ENV_VAR).map_err(|_| {
                error::invalid_input(format!(
                    "no bucket configured, set {BUCKET_ENV_VAR} or call `bucket()`"
                ))
            })?,
        };

        let shared_config = aws_config::from_env().load().await;
        let s3_client = aws_sdk_s3::Client::new(&shared_config);
        self.builder
            .storage(S3Storage::new(s3_client, bucket))
            .build()
    }
}
