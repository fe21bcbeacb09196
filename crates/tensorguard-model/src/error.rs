//! Contract model errors
//!
//! A [`ContractDefinitionError`] is a mistake in a declared contract and is
//! always fatal to the declaration. A [`DescribeError`] is an adapter's report
//! that a runtime value cannot be described; checkers record it and keep going.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractDefinitionError {
    #[error("Invalid dimension in shape: {value} (expected a positive integer, a symbol name, or a wildcard)")]
    InvalidDimension {
        value: String,
    },

    #[error("Invalid dimension in shape: 0 (fixed dimensions must be positive)")]
    ZeroDimension,

    #[error("Invalid dtype: {value} is not a supported element type")]
    UnsupportedElementType {
        value: String,
    },

    #[error("Invalid device: {value} is not a supported device (expected cpu, cuda or cuda:<index>)")]
    UnsupportedDevice {
        value: String,
    },

    #[error("Invalid library: {value} is not a supported tensor library")]
    UnsupportedLibrary {
        value: String,
    },

    #[error("Invalid {field}: symbol names must not be empty")]
    EmptySymbol {
        field: &'static str,
    },
}

pub type ContractResult<T> = Result<T, ContractDefinitionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescribeError {
    #[error("{type_name} is not an array-like value")]
    NotArrayLike {
        type_name: String,
    },

    #[error("unsupported {field} '{value}'")]
    UnsupportedMetadata {
        field: &'static str,
        value: String,
    },
}
