/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use crate::error::{self, Error, ErrorKind};
use crate::stager::StagingNamespace;
use crate::types::{UploadId, UploadSummary};

/// Lifecycle state of an upload session
///
/// Only `Open` sessions live in the registry. The remaining states are assigned as a session
/// is popped, completed and aborted sessions are represented by their absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Open,
    Completing,
    Completed,
    Aborted,
}

#[derive(Debug, Clone)]
pub(crate) struct UploadSession {
    pub(crate) id: UploadId,
    pub(crate) target: String,
    pub(crate) staging: StagingNamespace,
    pub(crate) initiated: SystemTime,
    pub(crate) state: SessionState,
}

impl UploadSession {
    pub(crate) fn new(id: UploadId, target: String, staging: StagingNamespace) -> Self {
        Self {
            id,
            target,
            staging,
            initiated: SystemTime::now(),
            state: SessionState::Open,
        }
    }

    fn summary(&self) -> UploadSummary {
        UploadSummary {
            upload_id: self.id.clone(),
            target: self.target.clone(),
            initiated: self.initiated,
        }
    }
}

/// Owns every in-progress upload session of a client.
///
/// All access goes through a single mutex which is never held across an await point.
#[derive(Debug, Default)]
pub(crate) struct SessionRegistry {
    sessions: Mutex<HashMap<UploadId, UploadSession>>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, session: UploadSession) -> Result<(), Error> {
        let mut sessions = self.sessions.lock()?;
        if sessions.contains_key(&session.id) {
            return Err(Error::new(
                ErrorKind::RuntimeError,
                format!("upload id `{}` is already in use", session.id),
            ));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    /// Snapshot of an open session
    pub(crate) fn get(&self, id: &UploadId) -> Result<UploadSession, Error> {
        let sessions = self.sessions.lock()?;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| error::upload_not_found(id))
    }

    /// Remove a session, handing exclusive ownership to the caller.
    ///
    /// Of any number of racing callers exactly one receives the session.
    pub(crate) fn pop(&self, id: &UploadId, next: SessionState) -> Result<UploadSession, Error> {
        let mut session = self
            .sessions
            .lock()?
            .remove(id)
            .ok_or_else(|| error::upload_not_found(id))?;
        session.state = next;
        Ok(session)
    }

    /// Summaries of all open sessions, oldest first.
    pub(crate) fn list(&self) -> Result<Vec<UploadSummary>, Error> {
        let sessions = self.sessions.lock()?;
        let mut summaries: Vec<_> = sessions.values().map(UploadSession::summary).collect();
        summaries.sort_by(|a, b| {
            a.initiated
                .cmp(&b.initiated)
                .then_with(|| a.upload_id.cmp(&b.upload_id))
        });
        Ok(summaries)
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or_default()
    }
}
