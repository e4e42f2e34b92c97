/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! In-memory implementation of the StorageBackend trait.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream;
use futures_util::StreamExt;
use tokio::sync::RwLock;

use crate::error::{self, Error};
use crate::storage::{MergeCapability, ObjectInfo, ObjectStream, StagedBlock, StorageBackend};

/// An in-memory implementation of the StorageBackend trait.
///
/// Objects live in a sorted map, which keeps prefix listings ordered. The merge capability is
/// chosen at construction so every merge strategy can be exercised without external services.
#[derive(Debug)]
pub struct InMemoryStorage {
    capability: MergeCapability,
    // key -> content
    objects: RwLock<BTreeMap<String, Bytes>>,
    namespaces: RwLock<BTreeSet<String>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage backend that merges by concatenation.
    pub fn new() -> Self {
        Self::with_capability(MergeCapability::Concatenate)
    }

    /// Create a new in-memory storage backend with the given merge capability.
    pub fn with_capability(capability: MergeCapability) -> Self {
        Self {
            capability,
            objects: RwLock::new(BTreeMap::new()),
            namespaces: RwLock::new(BTreeSet::new()),
        }
    }

    /// All keys currently stored, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Namespaces that have been created and not yet removed.
    pub async fn namespaces(&self) -> Vec<String> {
        self.namespaces.read().await.iter().cloned().collect()
    }

    fn concat(
        objects: &BTreeMap<String, Bytes>,
        operation: &'static str,
        keys: impl Iterator<Item = impl AsRef<str>>,
    ) -> Result<Bytes, Error> {
        let mut combined = BytesMut::new();
        for key in keys {
            let key = key.as_ref();
            let data = objects
                .get(key)
                .ok_or_else(|| error::object_not_found(operation, key))?;
            combined.extend_from_slice(data);
        }
        Ok(combined.freeze())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn merge_capability(&self) -> MergeCapability {
        self.capability
    }

    async fn create_namespace(&self, prefix: &str) -> Result<(), Error> {
        self.namespaces.write().await.insert(prefix.to_owned());
        Ok(())
    }

    async fn remove_namespace(&self, prefix: &str) -> Result<(), Error> {
        if !self.namespaces.write().await.remove(prefix) {
            return Err(error::object_not_found("remove_namespace", prefix));
        }
        Ok(())
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<ObjectInfo, Error> {
        let size = content.len() as u64;
        let mut objects = self.objects.write().await;
        objects.insert(key.to_owned(), content);
        Ok(ObjectInfo::new(key, size))
    }

    async fn get(&self, key: &str) -> Result<ObjectStream, Error> {
        let objects = self.objects.read().await;
        let data = objects
            .get(key)
            .cloned()
            .ok_or_else(|| error::object_not_found("get", key))?;
        Ok(stream::iter([Ok(data)]).boxed())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut objects = self.objects.write().await;
        if objects.remove(key).is_none() {
            return Err(error::object_not_found("delete", key));
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, Error> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| ObjectInfo::new(key.clone(), data.len() as u64))
            .collect())
    }

    async fn compose(&self, target: &str, sources: &[String]) -> Result<(), Error> {
        let max_sources = match self.capability {
            MergeCapability::Compose { max_sources } => max_sources,
            MergeCapability::Concatenate => usize::MAX,
            MergeCapability::BlockCommit => return Err(error::unsupported("compose", target)),
        };
        if sources.len() > max_sources {
            return Err(error::backend_io(
                "compose",
                target,
                format!(
                    "{} sources exceed the fan-in limit of {max_sources}",
                    sources.len()
                ),
            ));
        }

        let mut objects = self.objects.write().await;
        let combined = Self::concat(&objects, "compose", sources.iter())?;
        objects.insert(target.to_owned(), combined);
        Ok(())
    }

    async fn commit_block_list(&self, target: &str, blocks: &[StagedBlock]) -> Result<(), Error> {
        if self.capability != MergeCapability::BlockCommit {
            return Err(error::unsupported("commit_block_list", target));
        }

        let mut objects = self.objects.write().await;
        let combined = Self::concat(
            &objects,
            "commit_block_list",
            blocks.iter().map(StagedBlock::key),
        )?;
        // committed blocks are consumed by the commit
        for block in blocks {
            objects.remove(block.key());
        }
        objects.insert(target.to_owned(), combined);
        Ok(())
    }

    async fn copy_or_rename(&self, source: &str, destination: &str) -> Result<(), Error> {
        let mut objects = self.objects.write().await;
        let data = objects
            .remove(source)
            .ok_or_else(|| error::object_not_found("copy_or_rename", source))?;
        objects.insert(destination.to_owned(), data);
        Ok(())
    }
}
