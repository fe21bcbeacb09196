//! Tensorguard Checker
//!
//! Checks calls of tensor-contracted functions: field matching, symbolic
//! unification across parameters and return value, and "expected vs realized"
//! diagnostics.
//!
//! ## Example
//!
//! ```rust
//! use tensorguard_check::{check_call, RenderConfig};
//! use tensorguard_model::prelude::*;
//!
//! let registry = Registry::global();
//! let sig = Signature::new()
//!     .param("x", ContractSpec::new().shape(["n", "3"]).build(registry).unwrap())
//!     .param("y", ContractSpec::new().shape(["n"]).build(registry).unwrap());
//!
//! let x = Value::array(vec![8, 3], "float32", "cpu", "torch");
//! let y = Value::array(vec![4], "float32", "cpu", "torch");
//!
//! let verdict = check_call(&sig, registry, [("x", &x), ("y", &y)], None);
//! let report = verdict.failure().unwrap().report(&RenderConfig::plain());
//! assert!(report.starts_with("Expected args: x: Tensor([*n*, 3]), y: Tensor([*n*])"));
//! ```

pub mod error;
pub mod bindings;
pub mod matcher;
pub mod unify;
pub mod check;
pub mod render;


pub use error::{ContractViolation, ConversionError};
pub use bindings::{Binding, BindingTable};
pub use matcher::{contract_matches, diff, field_compatible, shape_compatible, slot_compatible};
pub use unify::{collect_bindings, Unifier};
pub use check::{check_call, CallCheck, CallVerdict, CheckedParam, Failure, FailureSite, Observed};
pub use render::{render_diff, render_failure, report_string, Highlight, RenderConfig};
