/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use crate::error::{self, Error};

/// Opaque, unguessable identifier of an upload session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadId(String);

impl UploadId {
    /// Generate a new identifier from the operating system's random number generator.
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UploadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UploadId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Caller supplied, 1-based number of a part.
///
/// Part numbers define the order of the assembled object. They do not have to be
/// contiguous and parts do not have to arrive in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartNumber(u32);

impl PartNumber {
    /// Create a part number, rejecting zero.
    pub fn new(value: u32) -> Result<Self, Error> {
        if value == 0 {
            return Err(error::invalid_input("part numbers start at 1"));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for PartNumber {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PartNumber::new(value)
    }
}

/// Number of decimal digits in a [`BlockId`]. Wide enough for every `u32`.
pub const BLOCK_ID_WIDTH: usize = 10;

/// Fixed-width, zero padded identifier of a staged part.
///
/// The rendered form sorts lexicographically in the same order as the part numbers, but the
/// numeric part number is carried alongside and is what ordering is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    part_number: PartNumber,
}

impl BlockId {
    /// The part number this block was staged for
    pub fn part_number(&self) -> PartNumber {
        self.part_number
    }
}

impl From<PartNumber> for BlockId {
    fn from(part_number: PartNumber) -> Self {
        Self { part_number }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.part_number.get(), width = BLOCK_ID_WIDTH)
    }
}

impl FromStr for BlockId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != BLOCK_ID_WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(error::invalid_input(format!("malformed block id `{s}`")));
        }
        let value: u32 = s
            .parse()
            .map_err(|_| error::invalid_input(format!("block id `{s}` out of range")))?;
        PartNumber::new(value).map(BlockId::from)
    }
}

/// A part that has been durably written to the staging namespace of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHandle {
    part_number: PartNumber,
    location: String,
    size: u64,
}

impl PartHandle {
    pub(crate) fn new(part_number: PartNumber, location: impl Into<String>, size: u64) -> Self {
        Self {
            part_number,
            location: location.into(),
            size,
        }
    }

    /// The part number supplied by the caller
    pub fn part_number(&self) -> PartNumber {
        self.part_number
    }

    /// The storage key the part's bytes are staged under
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Size of the part in bytes
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// An upload that has been initiated and not yet completed or aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub(crate) upload_id: UploadId,
    pub(crate) target: String,
    pub(crate) initiated: SystemTime,
}

impl UploadSummary {
    /// The upload identifier
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// Key of the object the upload will produce
    pub fn target(&self) -> &str {
        &self.target
    }

    /// When the upload was initiated
    pub fn initiated(&self) -> SystemTime {
        self.initiated
    }
}

/// The concurrency settings to use for backend requests issued by a single assembly.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencyMode {
    /// Use a reasonable default for the number of concurrent requests.
    #[default]
    Auto,

    /// Explicitly configured number of concurrent requests.
    Explicit(usize),
}
