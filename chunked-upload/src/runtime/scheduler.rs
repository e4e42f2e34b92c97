/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{self, ErrorKind};
use crate::types::ConcurrencyMode;
use crate::DEFAULT_CONCURRENCY;

/// Bounds the number of backend requests in flight
///
/// Scheduler is internally reference-counted and can be freely cloned.
#[derive(Debug, Clone)]
pub(crate) struct Scheduler {
    semaphore: Arc<Semaphore>,
}

impl Scheduler {
    /// Create a new scheduler with the initial number of work permits.
    pub(crate) fn new(mode: ConcurrencyMode) -> Self {
        let permits = match mode {
            ConcurrencyMode::Auto => DEFAULT_CONCURRENCY,
            ConcurrencyMode::Explicit(concurrency) => concurrency.max(1),
        };
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Acquire a permit to perform some unit of work
    pub(crate) async fn acquire_permit(&self) -> Result<OwnedWorkPermit, error::Error> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(error::from_kind(ErrorKind::RuntimeError))?;
        Ok(OwnedWorkPermit::from(permit))
    }
}

/// An owned permit from the scheduler to perform some unit of work.
#[must_use]
#[clippy::has_significant_drop]
#[derive(Debug)]
pub(crate) struct OwnedWorkPermit {
    _inner: OwnedSemaphorePermit,
}

impl From<OwnedSemaphorePermit> for OwnedWorkPermit {
    fn from(value: OwnedSemaphorePermit) -> Self {
        Self { _inner: value }
    }
}
