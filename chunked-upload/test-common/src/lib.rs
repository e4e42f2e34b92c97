/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chunked_upload::error::{self, Error};
use chunked_upload::storage::{
    MergeCapability, ObjectInfo, ObjectStream, StagedBlock, StorageBackend,
};

/// Install a tracing subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A storage primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateNamespace,
    RemoveNamespace,
    Put,
    PutStream,
    Get,
    Delete,
    List,
    Compose,
    CommitBlockList,
    CopyOrRename,
}

/// One recorded call: the primitive, the key (or target) and, for merges, the sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub key: String,
    pub sources: Vec<String>,
}

#[derive(Debug)]
struct Failure {
    op: Op,
    // number of calls that still succeed before the failure kicks in
    remaining: usize,
    key_contains: Option<String>,
}

/// Wraps a backend, recording every call and optionally injecting failures and latency.
#[derive(Debug)]
pub struct RecordingStorage<S> {
    inner: S,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<Failure>>,
    delays: Mutex<HashMap<Op, Duration>>,
}

impl<S: StorageBackend> RecordingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Every call of `op` fails.
    pub fn fail(&self, op: Op) {
        self.fail_after(op, 0);
    }

    /// Calls of `op` fail once `n` of them have succeeded.
    pub fn fail_after(&self, op: Op, n: usize) {
        self.failures.lock().unwrap().push(Failure {
            op,
            remaining: n,
            key_contains: None,
        });
    }

    /// Calls of `op` whose key contains `pattern` fail.
    pub fn fail_matching(&self, op: Op, pattern: &str) {
        self.failures.lock().unwrap().push(Failure {
            op,
            remaining: 0,
            key_contains: Some(pattern.to_owned()),
        });
    }

    /// Every call of `op` sleeps for `delay` before reaching the wrapped backend.
    pub fn delay(&self, op: Op, delay: Duration) {
        self.delays.lock().unwrap().insert(op, delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    /// `(target, sources)` of every compose call, in the order they were issued.
    pub fn compose_calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls_of(Op::Compose)
            .into_iter()
            .map(|c| (c.key, c.sources))
            .collect()
    }

    async fn enter(&self, op: Op, key: &str, sources: Vec<String>) -> Result<(), Error> {
        self.calls.lock().unwrap().push(Call {
            op,
            key: key.to_owned(),
            sources,
        });

        let delay = self.delays.lock().unwrap().get(&op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut failures = self.failures.lock().unwrap();
        for failure in failures.iter_mut().filter(|f| f.op == op) {
            if let Some(pattern) = &failure.key_contains {
                if !key.contains(pattern.as_str()) {
                    continue;
                }
            }
            if failure.remaining == 0 {
                return Err(error::backend_io(op_name(op), key, "injected failure"));
            }
            failure.remaining -= 1;
        }
        Ok(())
    }
}

fn op_name(op: Op) -> &'static str {
    match op {
        Op::CreateNamespace => "create_namespace",
        Op::RemoveNamespace => "remove_namespace",
        Op::Put => "put",
        Op::PutStream => "put_stream",
        Op::Get => "get",
        Op::Delete => "delete",
        Op::List => "list",
        Op::Compose => "compose",
        Op::CommitBlockList => "commit_block_list",
        Op::CopyOrRename => "copy_or_rename",
    }
}

#[async_trait]
impl<S: StorageBackend> StorageBackend for RecordingStorage<S> {
    fn merge_capability(&self) -> MergeCapability {
        self.inner.merge_capability()
    }

    async fn create_namespace(&self, prefix: &str) -> Result<(), Error> {
        self.enter(Op::CreateNamespace, prefix, Vec::new()).await?;
        self.inner.create_namespace(prefix).await
    }

    async fn remove_namespace(&self, prefix: &str) -> Result<(), Error> {
        self.enter(Op::RemoveNamespace, prefix, Vec::new()).await?;
        self.inner.remove_namespace(prefix).await
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<ObjectInfo, Error> {
        self.enter(Op::Put, key, Vec::new()).await?;
        self.inner.put(key, content).await
    }

    async fn put_stream(&self, key: &str, stream: ObjectStream) -> Result<ObjectInfo, Error> {
        self.enter(Op::PutStream, key, Vec::new()).await?;
        self.inner.put_stream(key, stream).await
    }

    async fn get(&self, key: &str) -> Result<ObjectStream, Error> {
        self.enter(Op::Get, key, Vec::new()).await?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.enter(Op::Delete, key, Vec::new()).await?;
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, Error> {
        self.enter(Op::List, prefix, Vec::new()).await?;
        self.inner.list(prefix).await
    }

    async fn compose(&self, target: &str, sources: &[String]) -> Result<(), Error> {
        self.enter(Op::Compose, target, sources.to_vec()).await?;
        self.inner.compose(target, sources).await
    }

    async fn commit_block_list(&self, target: &str, blocks: &[StagedBlock]) -> Result<(), Error> {
        let sources = blocks.iter().map(|b| b.key().to_owned()).collect();
        self.enter(Op::CommitBlockList, target, sources).await?;
        self.inner.commit_block_list(target, blocks).await
    }

    async fn copy_or_rename(&self, source: &str, destination: &str) -> Result<(), Error> {
        self.enter(Op::CopyOrRename, destination, vec![source.to_owned()])
            .await?;
        self.inner.copy_or_rename(source, destination).await
    }
}
