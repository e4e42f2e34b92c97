/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error::Error;
use crate::operation::required;

/// Input type for starting a chunked upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct InitiateUploadInput {
    /// Key of the object the upload will produce.
    pub target: String,
}

impl InitiateUploadInput {
    /// Creates a new builder-style object to manufacture [`InitiateUploadInput`].
    pub fn builder() -> InitiateUploadInputBuilder {
        InitiateUploadInputBuilder::default()
    }

    /// Key of the object the upload will produce.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// A builder for [`InitiateUploadInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct InitiateUploadInputBuilder {
    pub(crate) target: Option<String>,
}

impl InitiateUploadInputBuilder {
    /// Key of the object the upload will produce.
    ///
    /// A leading `/` is ignored. Keys that contain `..` segments escaping the root, end with
    /// `/`, or fall inside the staging prefix are rejected.
    /// Required.
    pub fn target(mut self, input: impl Into<String>) -> Self {
        self.target = Some(input.into());
        self
    }

    /// Key of the object the upload will produce.
    pub fn set_target(mut self, input: Option<String>) -> Self {
        self.target = input;
        self
    }

    /// Key of the object the upload will produce.
    pub fn get_target(&self) -> &Option<String> {
        &self.target
    }

    /// Consumes the builder and constructs an [`InitiateUploadInput`]
    pub fn build(self) -> Result<InitiateUploadInput, Error> {
        Ok(InitiateUploadInput {
            target: required(self.target, "target")?,
        })
    }
}
