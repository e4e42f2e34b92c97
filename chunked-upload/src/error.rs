/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_sdk_s3::error::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of chunked upload errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues (e.g. a part number of zero, or completing an upload
    /// with no staged parts)
    InputInvalid,

    /// The target path of an upload was rejected
    InvalidPath,

    /// Resource not found (e.g. unknown or already finalized upload, missing object)
    NotFound,

    /// An underlying storage operation failed
    BackendIo,

    /// Reconstructing the final object failed. Staged data has been cleaned up and the upload
    /// no longer exists.
    AssemblyFailed,

    /// The operation was cancelled through its cancellation token
    OperationCancelled,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,

    /// Removing staged data failed. Never returned from an operation, only logged.
    CleanupFailed,
}

impl Error {
    /// Creates a new [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::InvalidPath => write!(f, "invalid target path"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::BackendIo => write!(f, "storage backend error"),
            ErrorKind::AssemblyFailed => write!(f, "failed to assemble upload"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
            ErrorKind::CleanupFailed => write!(f, "failed to clean up staged data"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(value: std::sync::PoisonError<T>) -> Self {
        // the guard inside the poison error is not `Send`, keep only the message
        Self::new(ErrorKind::RuntimeError, value.to_string())
    }
}

/// A storage primitive that failed, along with the key it was operating on.
#[derive(Debug)]
pub struct BackendOperationError {
    operation: &'static str,
    key: String,
    source: BoxError,
}

impl BackendOperationError {
    /// The name of the storage primitive that failed (e.g. `put`, `compose`)
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The key the primitive was operating on
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for BackendOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for `{}`", self.operation, self.key)
    }
}

impl std::error::Error for BackendOperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

fn operation_error<E>(operation: &'static str, key: &str, err: E) -> BackendOperationError
where
    E: Into<BoxError>,
{
    BackendOperationError {
        operation,
        key: key.to_owned(),
        source: err.into(),
    }
}

/// Failure of a storage primitive, tagged with the operation name and key.
pub fn backend_io<E>(operation: &'static str, key: &str, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::BackendIo, operation_error(operation, key, err))
}

/// A storage primitive found nothing at `key`.
pub fn object_not_found(operation: &'static str, key: &str) -> Error {
    Error::new(
        ErrorKind::NotFound,
        operation_error(operation, key, "no such key"),
    )
}

/// Map an I/O error from a storage primitive, preserving `NotFound`.
pub(crate) fn from_io(operation: &'static str, key: &str, err: std::io::Error) -> Error {
    let kind = match err.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::BackendIo,
    };
    Error::new(kind, operation_error(operation, key, err))
}

pub(crate) fn unsupported(operation: &'static str, key: &str) -> Error {
    backend_io(
        operation,
        key,
        "operation is not supported by this storage backend",
    )
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn invalid_path<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InvalidPath, err)
}

pub(crate) fn upload_not_found(upload_id: &crate::types::UploadId) -> Error {
    Error::new(
        ErrorKind::NotFound,
        format!("no upload in progress with id `{upload_id}`"),
    )
}

pub(crate) fn assembly_failed(err: Error) -> Error {
    Error::new(ErrorKind::AssemblyFailed, err)
}

pub(crate) fn from_kind<E>(kind: ErrorKind) -> impl FnOnce(E) -> Error
where
    E: Into<BoxError>,
{
    |err| Error::new(kind, err)
}

static CANCELLATION_ERROR: &str = "the operation was cancelled before it could finish";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}
