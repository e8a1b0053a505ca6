// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Error types for plans and their steps.

use sqlex_db::ErrorKind;
use sqlex_verify::VerifyError;
use thiserror::Error;

/// A plan whose dependencies cannot be ordered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("step '{0}' is declared more than once")]
    DuplicateStep(String),

    #[error("step '{step}' runs after unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("dependency cycle between steps: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// A step that did not meet its expectation.
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("step '{step}': {source}")]
    Backend {
        step: String,
        #[source]
        source: sqlex_db::Error,
    },

    #[error("step '{step}': {source}")]
    Verify {
        step: String,
        #[source]
        source: VerifyError,
    },

    #[error("step '{step}': expected {expected}, but the statement succeeded")]
    UnexpectedSuccess { step: String, expected: ErrorKind },

    #[error("step '{step}': expected {expected}, got {actual}: {source}")]
    WrongErrorKind {
        step: String,
        expected: ErrorKind,
        actual: ErrorKind,
        #[source]
        source: sqlex_db::Error,
    },

    #[error("step '{step}': expected {expected} rows affected, got {actual}")]
    AffectedMismatch {
        step: String,
        expected: u64,
        actual: u64,
    },
}

impl StepError {
    /// Name of the failing step, if the failure belongs to one.
    pub fn step(&self) -> Option<&str> {
        match self {
            StepError::Plan(_) => None,
            StepError::Backend { step, .. }
            | StepError::Verify { step, .. }
            | StepError::UnexpectedSuccess { step, .. }
            | StepError::WrongErrorKind { step, .. }
            | StepError::AffectedMismatch { step, .. } => Some(step),
        }
    }
}
