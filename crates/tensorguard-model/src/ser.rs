//! JSON call files
//!
//! A call file describes one call to a guarded function: the declared
//! contracts of its parameters and return value, and the values supplied.
//!
//! ```json
//! {
//!   "params": [
//!     {"name": "x", "contract": {"shape": ["bs", 3], "dtype": "float32"},
//!      "value": {"array": {"shape": [8, 3], "dtype": "float32"}}}
//!   ],
//!   "return": {"contract": {"shape": ["bs"]},
//!              "value": {"array": {"shape": [8], "dtype": "float32"}}}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::contract::ContractSpec;
use crate::descriptor::Value;
use crate::error::ContractDefinitionError;
use crate::registry::Registry;
use crate::signature::Signature;

/// Serialization error
#[derive(Error, Debug)]
pub enum SerError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Contract for {name}: {source}")]
    Contract {
        name: String,
        source: ContractDefinitionError,
    },
}

pub type Result<T> = std::result::Result<T, SerError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReturnSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallSpec {
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default, rename = "return", skip_serializing_if = "Option::is_none")]
    pub ret: Option<ReturnSpec>,
}

impl CallSpec {
    /// Build the declared signature, validating every contract
    pub fn signature(&self, registry: &Registry) -> Result<Signature> {
        let mut sig = Signature::new();
        for param in &self.params {
            sig = match &param.contract {
                Some(spec) => sig.param(&param.name, build(&param.name, spec, registry)?),
                None => sig.untyped_param(&param.name),
            };
        }
        if let Some(contract) = self.ret.as_ref().and_then(|r| r.contract.as_ref()) {
            sig = sig.returns(build("return", contract, registry)?);
        }
        Ok(sig)
    }

    /// Supplied parameter values, by name
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params
            .iter()
            .filter_map(|p| p.value.as_ref().map(|v| (p.name.as_str(), v)))
    }

    pub fn return_value(&self) -> Option<&Value> {
        self.ret.as_ref().and_then(|r| r.value.as_ref())
    }
}

fn build(name: &str, spec: &ContractSpec, registry: &Registry) -> Result<crate::contract::TensorContract> {
    spec.build(registry).map_err(|source| SerError::Contract {
        name: name.to_string(),
        source,
    })
}

// ============ JSON ============

/// Serialize a call to JSON string
pub fn to_json(call: &CallSpec) -> Result<String> {
    Ok(serde_json::to_string_pretty(call)?)
}

/// Deserialize a call from JSON string
pub fn from_json(json: &str) -> Result<CallSpec> {
    Ok(serde_json::from_str(json)?)
}

/// Read a call file from disk
pub fn read_file(path: impl AsRef<Path>) -> Result<CallSpec> {
    let source = std::fs::read_to_string(path)?;
    from_json(&source)
}
