// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Status and error taxonomy for the filing layer and its callers.

use thiserror::Error;

/// Running status of a load or save pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Ok,
    /// File format is newer than this build understands
    UnknownVersion,
    /// Unrecognised section or token; the load still succeeds
    UnexpectedContent,
    /// A store could not grow
    OutOfMemory,
    /// A field was copied into a zero-length destination
    BadMemory,
    /// Oversized field, duplicate key, bad value or dangling reference
    Corrupt,
}

impl Status {
    /// Hard statuses abort the pass; the rest are advisory at most
    pub fn is_hard(self) -> bool {
        !matches!(self, Status::Ok | Status::UnexpectedContent)
    }
}

/// Hard failure of a load or save
#[derive(Debug, Error)]
pub enum FilingError {
    #[error("buttons file format {found} is newer than supported format {supported}")]
    UnknownVersion { found: String, supported: String },

    #[error("not enough memory to load the buttons file (line {line})")]
    OutOfMemory { line: usize },

    #[error("zero-length destination for field '{field}' (line {line})")]
    BadMemory { field: String, line: usize },

    #[error("buttons file is corrupt at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilingError {
    /// Status that this failure sets on the running pass
    pub fn status(&self) -> Status {
        match self {
            FilingError::UnknownVersion { .. } => Status::UnknownVersion,
            FilingError::OutOfMemory { .. } => Status::OutOfMemory,
            FilingError::BadMemory { .. } => Status::BadMemory,
            FilingError::Corrupt { .. } | FilingError::Io(_) => Status::Corrupt,
        }
    }

    pub fn corrupt(line: usize, reason: impl Into<String>) -> Self {
        FilingError::Corrupt { line, reason: reason.into() }
    }
}
