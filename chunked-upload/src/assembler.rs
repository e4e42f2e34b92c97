/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Reconstruction of the final object from staged parts.
//!
//! Ordering is shared by all strategies: parts are merged in ascending part number order.
//! Only the storage primitive used to merge them differs.

use std::sync::Arc;

use futures_util::future::try_join_all;
use futures_util::{stream, StreamExt, TryStreamExt};

use crate::cleanup::Intermediates;
use crate::error::{self, Error};
use crate::registry::UploadSession;
use crate::runtime::scheduler::Scheduler;
use crate::storage::{MergeCapability, StagedBlock, StorageBackend};
use crate::types::{BlockId, PartHandle};

/// How staged parts are merged into the target object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Stream every part, in order, into the target in one pass.
    Concatenate,

    /// Repeatedly compose contiguous runs of at most `fan_in` objects until one remains.
    ///
    /// Takes `⌈log_fan_in(N)⌉` rounds for `N` parts.
    BatchedCompose {
        /// Maximum number of sources per compose call, at least 2
        fan_in: usize,
    },

    /// Commit the staged parts as blocks of the target in a single call.
    BlockCommit,
}

impl MergeStrategy {
    /// The fan-in limit of a batched strategy
    pub fn fan_in(&self) -> Option<usize> {
        match self {
            MergeStrategy::BatchedCompose { fan_in } => Some(*fan_in),
            _ => None,
        }
    }

    /// Whether a backend with `capability` can carry out this strategy.
    ///
    /// Every backend can concatenate. Concatenating backends compose without a fan-in limit.
    pub(crate) fn supported_by(&self, capability: MergeCapability) -> bool {
        match self {
            MergeStrategy::Concatenate => true,
            MergeStrategy::BatchedCompose { .. } => capability != MergeCapability::BlockCommit,
            MergeStrategy::BlockCommit => capability == MergeCapability::BlockCommit,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self {
            MergeStrategy::BatchedCompose { fan_in } if *fan_in < 2 => Err(error::invalid_input(
                format!("compose fan-in must be at least 2, got {fan_in}"),
            )),
            _ => Ok(()),
        }
    }
}

impl From<MergeCapability> for MergeStrategy {
    fn from(value: MergeCapability) -> Self {
        match value {
            MergeCapability::Concatenate => MergeStrategy::Concatenate,
            MergeCapability::Compose { max_sources } => MergeStrategy::BatchedCompose {
                fan_in: max_sources,
            },
            MergeCapability::BlockCommit => MergeStrategy::BlockCommit,
        }
    }
}

/// Result of a successful assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Assembled {
    pub(crate) size: u64,
    pub(crate) parts: usize,
    pub(crate) rounds: usize,
}

/// Number of compose rounds needed to merge `parts` objects with the given fan-in.
pub(crate) fn compose_rounds(mut parts: usize, fan_in: usize) -> usize {
    let mut rounds = 0;
    while parts > 1 {
        parts = parts.div_ceil(fan_in);
        rounds += 1;
    }
    rounds
}

/// Merge `parts` (sorted by part number, non-empty) into the session's target.
///
/// Every intermediate object is recorded in `intermediates` before it is created.
pub(crate) async fn assemble(
    storage: &Arc<dyn StorageBackend>,
    scheduler: &Scheduler,
    strategy: MergeStrategy,
    session: &UploadSession,
    parts: &[PartHandle],
    intermediates: &mut Intermediates,
) -> Result<Assembled, Error> {
    strategy.validate()?;
    let target = session.target.as_str();
    let size = parts.iter().map(PartHandle::size).sum();

    let rounds = match strategy {
        MergeStrategy::Concatenate => {
            let written = concatenate(storage, scheduler, target, parts).await?;
            debug_assert_eq!(size, written);
            0
        }
        MergeStrategy::BatchedCompose { fan_in } => {
            let sources = parts.iter().map(|p| p.location().to_owned()).collect();
            compose_batched(
                storage.as_ref(),
                scheduler,
                session,
                sources,
                fan_in,
                intermediates,
            )
            .await?
        }
        MergeStrategy::BlockCommit => {
            commit_blocks(storage.as_ref(), scheduler, target, parts).await?;
            0
        }
    };

    tracing::debug!(
        "assembled {} parts ({size} bytes) into {target} in {rounds} compose rounds",
        parts.len()
    );
    Ok(Assembled {
        size,
        parts: parts.len(),
        rounds,
    })
}

async fn concatenate(
    storage: &Arc<dyn StorageBackend>,
    scheduler: &Scheduler,
    target: &str,
    parts: &[PartHandle],
) -> Result<u64, Error> {
    let _permit = scheduler.acquire_permit().await?;
    let keys: Vec<String> = parts.iter().map(|p| p.location().to_owned()).collect();
    let source = storage.clone();
    // parts are opened one at a time as the previous one is drained
    let body = stream::iter(keys)
        .then(move |key| {
            let storage = source.clone();
            async move { storage.get(&key).await }
        })
        .try_flatten()
        .boxed();
    let info = storage.put_stream(target, body).await?;
    Ok(info.size())
}

async fn compose_batched(
    storage: &dyn StorageBackend,
    scheduler: &Scheduler,
    session: &UploadSession,
    sources: Vec<String>,
    fan_in: usize,
    intermediates: &mut Intermediates,
) -> Result<usize, Error> {
    let target = session.target.as_str();
    let expected_rounds = compose_rounds(sources.len(), fan_in);
    let mut current = sources;
    let mut round = 0;

    while current.len() > 1 {
        round += 1;
        let final_round = current.len() <= fan_in;
        let mut next = Vec::with_capacity(current.len().div_ceil(fan_in));
        let mut calls = Vec::new();

        for (index, run) in current.chunks(fan_in).enumerate() {
            if let [single] = run {
                next.push(single.clone());
                continue;
            }
            let destination = if final_round {
                target.to_owned()
            } else {
                let key = session.staging.intermediate_key(round, index);
                intermediates.track(key.clone());
                key
            };
            next.push(destination.clone());
            calls.push(compose_run(storage, scheduler, destination, run));
        }

        tracing::trace!(
            "compose round {round}: {} objects into {}",
            current.len(),
            next.len()
        );
        try_join_all(calls).await?;
        current = next;
    }

    match current.as_slice() {
        [survivor] if survivor != target => storage.copy_or_rename(survivor, target).await?,
        _ => {}
    }
    debug_assert_eq!(expected_rounds, round);
    Ok(round)
}

async fn compose_run(
    storage: &dyn StorageBackend,
    scheduler: &Scheduler,
    destination: String,
    run: &[String],
) -> Result<(), Error> {
    let _permit = scheduler.acquire_permit().await?;
    storage.compose(&destination, run).await
}

async fn commit_blocks(
    storage: &dyn StorageBackend,
    scheduler: &Scheduler,
    target: &str,
    parts: &[PartHandle],
) -> Result<(), Error> {
    let mut blocks: Vec<StagedBlock> = parts
        .iter()
        .map(|p| StagedBlock::new(BlockId::from(p.part_number()), p.location()))
        .collect();
    blocks.sort_by_key(|b| b.block_id().part_number());

    let _permit = scheduler.acquire_permit().await?;
    storage.commit_block_list(target, &blocks).await
}
