/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Chunked uploads: stage the parts of a large object independently and out of order,
//! then assemble them into one byte-exact final object.
//!
//! An upload goes through a small protocol:
//!
//! 1. [`initiate_upload`](crate::Client::initiate_upload) creates a session and a staging
//!    namespace exclusively owned by it.
//! 2. [`upload_part`](crate::Client::upload_part) stages a numbered part. Parts may arrive in
//!    any order, concurrently, and may be retried.
//! 3. [`complete_upload`](crate::Client::complete_upload) assembles the staged parts in
//!    ascending part number order, or [`abort_upload`](crate::Client::abort_upload) discards
//!    them. Either call finalizes the session exactly once.
//!
//! How parts are merged depends on the [storage backend](crate::storage::StorageBackend):
//! streaming concatenation, fan-in limited composition, or a single block-list commit.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> Result<(), chunked_upload::error::Error> {
//! use chunked_upload::storage::InMemoryStorage;
//!
//! let config = chunked_upload::Config::builder()
//!     .storage(InMemoryStorage::new())
//!     .build()?;
//! let client = chunked_upload::Client::new(config);
//!
//! let upload = client.initiate_upload().target("video.mp4").send().await?;
//! client
//!     .upload_part()
//!     .upload_id(upload.upload_id().clone())
//!     .part_number(1)
//!     .body("hello ")
//!     .send()
//!     .await?;
//! client
//!     .upload_part()
//!     .upload_id(upload.upload_id().clone())
//!     .part_number(2)
//!     .body("world")
//!     .send()
//!     .await?;
//!
//! let completed = client
//!     .complete_upload()
//!     .upload_id(upload.upload_id().clone())
//!     .send()
//!     .await?;
//! assert_eq!(completed.size(), 11);
//! # Ok(())
//! # }
//! ```

/// Default in-flight concurrency for backend requests issued by a single assembly
pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error types emitted by `chunked-upload`
pub mod error;

/// Common types used by `chunked-upload`
pub mod types;

/// Storage backends and the primitives they provide
pub mod storage;

/// Chunked upload client
pub mod client;

/// Chunked upload operations
pub mod operation;

/// Client configuration
pub mod config;

/// Upload session bookkeeping
pub(crate) mod registry;

/// Part staging and the staging namespace layout
pub(crate) mod stager;

/// Reconstruction of the final object from staged parts
pub(crate) mod assembler;

/// Best-effort removal of staged data
pub(crate) mod cleanup;

/// Internal runtime components
pub(crate) mod runtime;

pub use self::assembler::MergeStrategy;
pub use self::cleanup::CleanupReport;
pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader that targets Amazon S3 using the environment's AWS configuration
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
