//! # Tensorguard Model
//!
//! Data model for tensor contracts.
//!
//! A contract declares, for one parameter or return value of a function,
//! what array-like values it accepts:
//! - Shape, with fixed sizes, per-position wildcards and shared symbols
//! - Element type (`float32`, `int64`, ...)
//! - Storage device (`cpu`, `cuda:<index>`)
//! - Backing library (`torch`, `numpy`)
//!
//! Any field may be left open, or bound to a symbol that must resolve to the
//! same value across the whole call. Observed values are reduced by an
//! adapter ([`descriptor::Describe`]) to a [`descriptor::ConcreteDescriptor`].
//!
//! ## Example
//!
//! ```rust
//! use tensorguard_model::prelude::*;
//!
//! let registry = Registry::global();
//! let images = ContractSpec::new()
//!     .shape([DimSpec::from("bs"), 3.into(), 224.into(), 224.into()])
//!     .dtype("half")
//!     .device("cuda")
//!     .build(registry)
//!     .unwrap();
//!
//! assert_eq!(images.to_string(), "Tensor([bs, 3, 224, 224], float16, cuda:0)");
//! ```

pub mod symbol;
pub mod types;
pub mod error;
pub mod registry;
pub mod contract;
pub mod descriptor;
pub mod signature;
pub mod ser;

pub use error::{ContractDefinitionError, ContractResult, DescribeError};

/// Prelude - common imports
pub mod prelude {
    pub use crate::symbol::Symbol;
    pub use crate::types::{Device, DeviceKind, ElementType, Library};
    pub use crate::error::{ContractDefinitionError, DescribeError};
    pub use crate::registry::Registry;
    pub use crate::contract::{
        ContractSpec, Dim, DimSpec, FieldKind, FieldRef, FieldSpec, Scalar, Slot, TensorContract,
    };
    pub use crate::descriptor::{ConcreteDescriptor, Describe, Value};
    pub use crate::signature::{ParamContract, Signature};
    pub use crate::ser;
}
