/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashSet;

use aws_sdk_s3::error::DisplayErrorContext;

use crate::error::{Error, ErrorKind};
use crate::stager::StagingNamespace;
use crate::storage::StorageBackend;

/// Keys of the intermediate objects created while assembling an upload.
///
/// A key is tracked before the request that creates it is issued, so an object left behind by
/// an interrupted compose is still removed.
#[derive(Debug, Default)]
pub(crate) struct Intermediates {
    keys: Vec<String>,
}

impl Intermediates {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Outcome of removing the staged data of an upload.
///
/// Cleanup is best effort: failures are logged and counted, never returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    deleted: usize,
    failed: usize,
}

impl CleanupReport {
    /// Number of staged or intermediate objects deleted
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    /// Number of delete (or namespace removal) requests that failed
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// True when every staged object was removed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

fn log_failure(what: &str, key: &str, err: Error) {
    let err = Error::new(ErrorKind::CleanupFailed, err);
    tracing::warn!("failed to {what} {key}: {}", DisplayErrorContext(&err));
}

/// Delete everything an upload left in storage: intermediates first, then whatever remains
/// under the staging namespace, then the namespace itself.
pub(crate) async fn cleanup_session(
    storage: &dyn StorageBackend,
    staging: &StagingNamespace,
    intermediates: &Intermediates,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    let mut attempted = HashSet::new();

    for key in intermediates.iter() {
        attempted.insert(key.to_owned());
        delete_one(storage, key, &mut report).await;
    }

    match storage.list(staging.root()).await {
        Ok(objects) => {
            for object in objects {
                if attempted.insert(object.key().to_owned()) {
                    delete_one(storage, object.key(), &mut report).await;
                }
            }
        }
        Err(err) => {
            report.failed += 1;
            log_failure("list staged objects under", staging.root(), err);
        }
    }

    if !discard_namespace(storage, staging.root()).await {
        report.failed += 1;
    }

    tracing::debug!(
        "cleaned up {} ({} intermediates): {} objects deleted, {} failures",
        staging.root(),
        intermediates.len(),
        report.deleted,
        report.failed
    );
    report
}

/// Remove a staging namespace, logging a failure instead of returning it.
///
/// Returns `false` if the namespace could not be removed. A namespace that is already gone
/// counts as removed.
pub(crate) async fn discard_namespace(storage: &dyn StorageBackend, root: &str) -> bool {
    match storage.remove_namespace(root).await {
        Ok(()) => true,
        Err(err) if err.kind() == &ErrorKind::NotFound => true,
        Err(err) => {
            log_failure("remove staging namespace", root, err);
            false
        }
    }
}

async fn delete_one(storage: &dyn StorageBackend, key: &str, report: &mut CleanupReport) {
    match storage.delete(key).await {
        Ok(()) => report.deleted += 1,
        // already gone, e.g. consumed by a block commit or never created
        Err(err) if err.kind() == &ErrorKind::NotFound => {}
        Err(err) => {
            report.failed += 1;
            log_failure("delete", key, err);
        }
    }
}
