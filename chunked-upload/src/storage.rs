/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Storage backends.
//!
//! This module provides the [`StorageBackend`] trait and its implementations. The trait is the
//! only way the upload engine touches storage: staging parts, merging them into the target and
//! cleaning up afterwards are all expressed in terms of these primitives.
//!
//! Backends differ in how they can merge objects, which they advertise through
//! [`StorageBackend::merge_capability`]:
//!
//! - [`FilesystemStorage`] concatenates files in a single streaming pass.
//! - [`S3Storage`] composes up to 10,000 sources per call.
//! - [`InMemoryStorage`] can be configured to behave like any of the three kinds.

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use crate::error::{self, Error};
use crate::types::BlockId;

mod filesystem;
mod in_memory;
mod s3;

pub use filesystem::FilesystemStorage;
pub use in_memory::InMemoryStorage;
pub use s3::S3Storage;

/// Stream of object bytes.
pub type ObjectStream = BoxStream<'static, Result<Bytes, Error>>;

/// Key and size of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    key: String,
    size: u64,
}

impl ObjectInfo {
    /// Describe an object stored under `key`
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// The object key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Size of the object in bytes
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A staged part referenced by a block-list commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBlock {
    block_id: BlockId,
    key: String,
}

impl StagedBlock {
    pub(crate) fn new(block_id: BlockId, key: impl Into<String>) -> Self {
        Self {
            block_id,
            key: key.into(),
        }
    }

    /// Identifier of the block
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// Key the block's bytes are staged under
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// How a backend merges several objects into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCapability {
    /// Any number of objects can be streamed into a new object in one linear pass.
    ///
    /// Such a backend also composes, without a fan-in limit.
    Concatenate,

    /// [`StorageBackend::compose`] merges at most `max_sources` objects per call.
    Compose {
        /// Fan-in limit of a single compose call
        max_sources: usize,
    },

    /// Staged blocks become an object through one [`StorageBackend::commit_block_list`] call.
    BlockCommit,
}

/// A storage backend for chunked uploads.
///
/// Keys are `/` separated strings. A prefix passed to [`list`](Self::list) or the namespace
/// methods always ends with `/`.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// How this backend merges objects.
    fn merge_capability(&self) -> MergeCapability;

    /// Prepare a namespace that will hold staged objects.
    ///
    /// Flat object stores have nothing to do here.
    async fn create_namespace(&self, _prefix: &str) -> Result<(), Error> {
        Ok(())
    }

    /// Remove a namespace once the objects inside it have been deleted.
    async fn remove_namespace(&self, _prefix: &str) -> Result<(), Error> {
        Ok(())
    }

    /// Store `content` under `key`, replacing any existing object.
    ///
    /// The object must be durable (visible to [`get`](Self::get) and [`list`](Self::list))
    /// by the time this returns.
    async fn put(&self, key: &str, content: Bytes) -> Result<ObjectInfo, Error>;

    /// Store the bytes of `stream` under `key`.
    ///
    /// The default implementation buffers the stream and calls [`put`](Self::put).
    async fn put_stream(&self, key: &str, mut stream: ObjectStream) -> Result<ObjectInfo, Error> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        self.put(key, buffer.freeze()).await
    }

    /// Stream the object stored under `key`.
    async fn get(&self, key: &str) -> Result<ObjectStream, Error>;

    /// Delete the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// List all objects whose key starts with `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, Error>;

    /// Merge `sources`, in order, into a new object at `target`.
    ///
    /// Callers never pass more sources than the backend's fan-in limit. The default
    /// implementation buffers the sources and calls [`put`](Self::put), which is all a
    /// concatenating backend needs.
    async fn compose(&self, target: &str, sources: &[String]) -> Result<(), Error> {
        let mut buffer = BytesMut::new();
        for source in sources {
            let mut stream = self.get(source).await?;
            while let Some(chunk) = stream.next().await {
                buffer.extend_from_slice(&chunk?);
            }
        }
        self.put(target, buffer.freeze()).await.map(|_| ())
    }

    /// Commit the given staged blocks, in order, as the object at `target`.
    async fn commit_block_list(&self, target: &str, _blocks: &[StagedBlock]) -> Result<(), Error> {
        Err(error::unsupported("commit_block_list", target))
    }

    /// Move (or copy) the object at `source` to `destination`.
    async fn copy_or_rename(&self, source: &str, destination: &str) -> Result<(), Error>;
}

/// Read a whole object into memory.
pub async fn read_to_bytes(storage: &dyn StorageBackend, key: &str) -> Result<Bytes, Error> {
    let mut stream = storage.get(key).await?;
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}
