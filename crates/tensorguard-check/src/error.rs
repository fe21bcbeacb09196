//! Contract checking errors
//!
//! A [`ConversionError`] is recorded when a supplied value cannot be
//! described at all; it never aborts a check. A [`ContractViolation`] is the
//! failed verdict of a whole call, carrying the rendered report.

use tensorguard_model::DescribeError;
use thiserror::Error;

use crate::check::Failure;

/// A parameter whose value is not array-like
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{parameter}({cause}): '{value}'")]
pub struct ConversionError {
    pub parameter: String,
    pub cause: DescribeError,
    pub value: String,
}

/// A call whose arguments or return value break the declared contracts
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ContractViolation {
    message: String,
    failure: Box<Failure>,
}

impl ContractViolation {
    pub(crate) fn new(message: String, failure: Box<Failure>) -> Self {
        ContractViolation { message, failure }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn failure(&self) -> &Failure {
        &self.failure
    }
}
