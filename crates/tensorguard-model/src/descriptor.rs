//! Observed array metadata
//!
//! A [`ConcreteDescriptor`] is what an adapter reports about one runtime
//! value. Adapters implement [`Describe`]; the checker never looks at array
//! contents, only at the descriptor.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::contract::TensorContract;
use crate::error::DescribeError;
use crate::registry::Registry;
use crate::types::{Device, ElementType, Library};

/// Concrete metadata of one array-like value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteDescriptor {
    pub shape: Vec<u64>,
    pub dtype: ElementType,
    pub device: Device,
    pub library: Library,
}

impl ConcreteDescriptor {
    pub fn new(shape: impl Into<Vec<u64>>, dtype: ElementType, device: Device, library: Library) -> Self {
        ConcreteDescriptor {
            shape: shape.into(),
            dtype,
            device,
            library,
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

impl fmt::Display for ConcreteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", TensorContract::from(self))
    }
}

/// Adapter from a runtime value to its descriptor
pub trait Describe {
    /// Describe the value, or report why it is not array-like
    fn describe(&self, registry: &Registry) -> Result<ConcreteDescriptor, DescribeError>;

    /// Type name shown when the value is not checked as an array
    fn type_name(&self, registry: &Registry) -> Cow<'_, str>;

    /// Text shown for the value when it cannot be described
    fn repr(&self) -> String;
}

impl Describe for ConcreteDescriptor {
    fn describe(&self, _registry: &Registry) -> Result<ConcreteDescriptor, DescribeError> {
        Ok(self.clone())
    }

    fn type_name(&self, _registry: &Registry) -> Cow<'_, str> {
        Cow::Owned(self.library.to_string())
    }

    fn repr(&self) -> String {
        self.to_string()
    }
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe(&self, registry: &Registry) -> Result<ConcreteDescriptor, DescribeError> {
        (**self).describe(registry)
    }

    fn type_name(&self, registry: &Registry) -> Cow<'_, str> {
        (**self).type_name(registry)
    }

    fn repr(&self) -> String {
        (**self).repr()
    }
}

// ============================================================================
// Tooling Values
// ============================================================================

/// A runtime value as written in JSON call files
///
/// Arrays carry their metadata as tokens so that unsupported metadata
/// surfaces as a conversion error rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Array {
        shape: Vec<u64>,
        dtype: String,
        #[serde(default = "default_device")]
        device: String,
        #[serde(default = "default_library")]
        library: String,
    },
    Other {
        type_name: String,
        repr: String,
    },
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_library() -> String {
    "torch".to_string()
}

impl Value {
    pub fn array(shape: impl Into<Vec<u64>>, dtype: &str, device: &str, library: &str) -> Self {
        Value::Array {
            shape: shape.into(),
            dtype: dtype.to_string(),
            device: device.to_string(),
            library: library.to_string(),
        }
    }

    pub fn other(type_name: &str, repr: &str) -> Self {
        Value::Other {
            type_name: type_name.to_string(),
            repr: repr.to_string(),
        }
    }
}

impl From<&ConcreteDescriptor> for Value {
    fn from(desc: &ConcreteDescriptor) -> Self {
        Value::Array {
            shape: desc.shape.clone(),
            dtype: desc.dtype.as_str().to_string(),
            device: desc.device.to_string(),
            library: desc.library.as_str().to_string(),
        }
    }
}

impl Describe for Value {
    fn describe(&self, registry: &Registry) -> Result<ConcreteDescriptor, DescribeError> {
        match self {
            Value::Array { shape, dtype, device, library } => {
                let unsupported = |field: &'static str, value: &str| DescribeError::UnsupportedMetadata {
                    field,
                    value: value.to_string(),
                };
                Ok(ConcreteDescriptor {
                    shape: shape.clone(),
                    dtype: registry.element_type(dtype).ok_or_else(|| unsupported("dtype", dtype))?,
                    device: registry.device(device).ok_or_else(|| unsupported("device", device))?,
                    library: registry.library(library).ok_or_else(|| unsupported("library", library))?,
                })
            }
            Value::Other { type_name, .. } => Err(DescribeError::NotArrayLike {
                type_name: type_name.clone(),
            }),
        }
    }

    fn type_name(&self, registry: &Registry) -> Cow<'_, str> {
        match self {
            Value::Array { library, .. } => match registry.library(library) {
                Some(lib) => Cow::Owned(lib.to_string()),
                None => Cow::Borrowed(library.as_str()),
            },
            Value::Other { type_name, .. } => Cow::Borrowed(type_name.as_str()),
        }
    }

    fn repr(&self) -> String {
        match self {
            Value::Array { shape, dtype, device, library } => {
                format!("{}(shape={:?}, dtype={}, device={})", library, shape, dtype, device)
            }
            Value::Other { repr, .. } => repr.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_array() {
        let v = Value::array(vec![2, 3], "torch.float32", "cuda", "torch");
        let desc = v.describe(Registry::global()).unwrap();
        assert_eq!(
            desc,
            ConcreteDescriptor::new(vec![2, 3], ElementType::Float32, Device::Cuda(0), Library::Torch)
        );
        assert_eq!(desc.rank(), 2);
        assert_eq!(desc.to_string(), "Torch([2, 3], float32, cuda:0)");
    }

    #[test]
    fn test_describe_other() {
        let v = Value::other("str", "hello");
        let err = v.describe(Registry::global()).unwrap_err();
        assert_eq!(err, DescribeError::NotArrayLike { type_name: "str".into() });
        assert_eq!(err.to_string(), "str is not an array-like value");
        assert_eq!(v.type_name(Registry::global()), "str");
        assert_eq!(v.repr(), "hello");
    }

    #[test]
    fn test_describe_unsupported_metadata() {
        let v = Value::array(vec![4], "complex64", "cpu", "numpy");
        let err = v.describe(Registry::global()).unwrap_err();
        assert_eq!(
            err,
            DescribeError::UnsupportedMetadata { field: "dtype", value: "complex64".into() }
        );
        assert_eq!(v.type_name(Registry::global()), "Numpy");
    }

    #[test]
    fn test_type_name_uses_given_registry() {
        let reg = Registry::builder().library_alias("pt", Library::Torch).build();
        let v = Value::array(vec![4], "complex64", "cpu", "pt");

        assert_eq!(v.type_name(&reg), "Torch");
        assert_eq!(v.type_name(Registry::global()), "pt");
        assert!(matches!(
            v.describe(&reg),
            Err(DescribeError::UnsupportedMetadata { field: "dtype", .. })
        ));
    }

    #[test]
    fn test_value_json_defaults() {
        let v: Value = serde_json::from_str(r#"{"array": {"shape": [1, 2], "dtype": "int64"}}"#).unwrap();
        assert_eq!(v, Value::array(vec![1, 2], "int64", "cpu", "torch"));

        let desc = v.describe(Registry::global()).unwrap();
        assert_eq!(Value::from(&desc), v);
    }

    #[test]
    fn test_descriptor_describes_itself() {
        let desc = ConcreteDescriptor::new(vec![5], ElementType::Int8, Device::Cpu, Library::Numpy);
        assert_eq!(desc.describe(Registry::global()).unwrap(), desc);
        assert_eq!(desc.type_name(Registry::global()), "Numpy");
    }
}
