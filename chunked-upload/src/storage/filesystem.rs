/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Filesystem implementation of the StorageBackend trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::error::{self, Error};
use crate::storage::{MergeCapability, ObjectInfo, ObjectStream, StorageBackend};

/// A filesystem implementation of the StorageBackend trait.
///
/// Every key maps to a file below `<root>/objects`. Writes go to a scratch file under
/// `<root>/tmp` first and are renamed into place once flushed and synced, so a key only ever
/// refers to a complete object.
///
/// Merging streams every source into the target in a single pass, without a fan-in limit.
#[derive(Debug)]
pub struct FilesystemStorage {
    root_dir: PathBuf,
    objects_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl FilesystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// # Arguments
    ///
    /// * `root_dir` - The root directory for storing objects
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created
    pub async fn new(root_dir: impl AsRef<Path>) -> Result<Self, Error> {
        let root_dir = root_dir.as_ref().to_path_buf();
        let objects_dir = root_dir.join("objects");
        let tmp_dir = root_dir.join("tmp");

        for dir in [&objects_dir, &tmp_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|err| error::from_io("create_dir", &dir.to_string_lossy(), err))?;
        }

        Ok(Self {
            root_dir,
            objects_dir,
            tmp_dir,
        })
    }

    /// The root directory of this backend
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The file backing `key`
    pub fn object_path(&self, key: &str) -> PathBuf {
        object_key_to_path(&self.objects_dir, key)
    }

    fn scratch_path(&self) -> PathBuf {
        self.tmp_dir.join(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Write `stream` to a scratch file and rename it to `key` once it is durable.
    async fn write_atomically(
        &self,
        operation: &'static str,
        key: &str,
        mut stream: ObjectStream,
    ) -> Result<ObjectInfo, Error> {
        let mut scratch = ScratchFile::new(self.scratch_path());
        let result = async {
            let mut file = fs::File::create(&scratch.path)
                .await
                .map_err(|err| error::from_io(operation, key, err))?;
            let mut size = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|err| error::from_io(operation, key, err))?;
                size += chunk.len() as u64;
            }
            file.flush()
                .await
                .map_err(|err| error::from_io(operation, key, err))?;
            file.sync_all()
                .await
                .map_err(|err| error::from_io(operation, key, err))?;

            let dest = self.object_path(key);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| error::from_io(operation, key, err))?;
            }
            fs::rename(&scratch.path, &dest)
                .await
                .map_err(|err| error::from_io(operation, key, err))?;
            Ok::<_, Error>(ObjectInfo::new(key, size))
        }
        .await;

        if result.is_ok() {
            scratch.persisted = true;
        }
        result
    }

    /// Lazily chain the contents of `sources` into one stream.
    fn chain_sources(&self, sources: &[String]) -> ObjectStream {
        let paths: Vec<(String, PathBuf)> = sources
            .iter()
            .map(|key| (key.clone(), self.object_path(key)))
            .collect();
        futures_util::stream::iter(paths)
            .then(|(key, path)| async move { open_stream("compose", key, path).await })
            .try_flatten()
            .boxed()
    }
}

/// Removes a scratch file that never made it into place, including when the write is dropped.
#[derive(Debug)]
struct ScratchFile {
    path: PathBuf,
    persisted: bool,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

async fn open_stream(
    operation: &'static str,
    key: String,
    path: PathBuf,
) -> Result<ObjectStream, Error> {
    let file = fs::File::open(&path)
        .await
        .map_err(|err| error::from_io(operation, &key, err))?;
    Ok(ReaderStream::new(file)
        .map_err(move |err| error::from_io(operation, &key, err))
        .boxed())
}

#[async_trait]
impl StorageBackend for FilesystemStorage {
    fn merge_capability(&self) -> MergeCapability {
        MergeCapability::Concatenate
    }

    async fn create_namespace(&self, prefix: &str) -> Result<(), Error> {
        fs::create_dir_all(self.object_path(prefix))
            .await
            .map_err(|err| error::from_io("create_namespace", prefix, err))
    }

    async fn remove_namespace(&self, prefix: &str) -> Result<(), Error> {
        fs::remove_dir_all(self.object_path(prefix))
            .await
            .map_err(|err| error::from_io("remove_namespace", prefix, err))
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<ObjectInfo, Error> {
        let stream = futures_util::stream::iter([Ok(content)]).boxed();
        self.write_atomically("put", key, stream).await
    }

    async fn put_stream(&self, key: &str, stream: ObjectStream) -> Result<ObjectInfo, Error> {
        self.write_atomically("put_stream", key, stream).await
    }

    async fn get(&self, key: &str) -> Result<ObjectStream, Error> {
        open_stream("get", key.to_owned(), self.object_path(key)).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        fs::remove_file(self.object_path(key))
            .await
            .map_err(|err| error::from_io("delete", key, err))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, Error> {
        let objects_dir = self.objects_dir.clone();
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || list_files(&objects_dir, &prefix)).await?
    }

    async fn compose(&self, target: &str, sources: &[String]) -> Result<(), Error> {
        self.write_atomically("compose", target, self.chain_sources(sources))
            .await
            .map(|_| ())
    }

    async fn copy_or_rename(&self, source: &str, destination: &str) -> Result<(), Error> {
        let dest = self.object_path(destination);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| error::from_io("copy_or_rename", destination, err))?;
        }
        fs::rename(self.object_path(source), dest)
            .await
            .map_err(|err| error::from_io("copy_or_rename", source, err))
    }
}

fn list_files(objects_dir: &Path, prefix: &str) -> Result<Vec<ObjectInfo>, Error> {
    // only walk the deepest directory that can contain matches
    let start = match prefix.rfind('/') {
        Some(idx) => object_key_to_path(objects_dir, &prefix[..idx]),
        None => objects_dir.to_path_buf(),
    };
    if !start.exists() {
        return Ok(Vec::new());
    }

    let mut objects = Vec::new();
    for entry in walkdir::WalkDir::new(&start) {
        let entry = entry.map_err(|err| error::backend_io("list", prefix, err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = path_to_object_key(objects_dir, entry.path()) else {
            continue;
        };
        if !key.starts_with(prefix) {
            continue;
        }
        let size = entry
            .metadata()
            .map_err(|err| error::backend_io("list", &key, err))?
            .len();
        objects.push(ObjectInfo::new(key, size));
    }
    objects.sort_by(|a, b| a.key().cmp(b.key()));
    Ok(objects)
}

/// Convert an object key to a filesystem path below `base_dir`.
fn object_key_to_path(base_dir: impl AsRef<Path>, key: &str) -> PathBuf {
    // Handle keys with leading slashes by removing them
    let key = key.trim_start_matches('/');
    let mut path = base_dir.as_ref().to_path_buf();
    path.extend(key.split('/').filter(|segment| !segment.is_empty()));
    path
}

/// Convert a file below `base_dir` back into its object key.
fn path_to_object_key(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;
    let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
    Some(segments?.join("/"))
}
