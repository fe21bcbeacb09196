//! Concrete metadata values
//!
//! Element types, storage devices and backing array libraries. These are the
//! values a contract field can be fixed to and the values an observed array
//! always carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    // Floating point
    Float16,
    Float32,
    Float64,

    // Unsigned integers
    Uint8,

    // Signed integers
    Int8,
    Int16,
    Int32,
    Int64,
}

impl ElementType {
    pub const ALL: [ElementType; 8] = [
        ElementType::Float16,
        ElementType::Float32,
        ElementType::Float64,
        ElementType::Uint8,
        ElementType::Int8,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
    ];

    /// Canonical lower-case name
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Float16 => "float16",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Uint8 => "uint8",
            ElementType::Int8 => "int8",
            ElementType::Int16 => "int16",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of storage device, before an index is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Cuda,
}

/// Storage device of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Device {
    Cpu,
    /// CUDA device with its ordinal; bare `cuda` means ordinal 0
    Cuda(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(index) => write!(f, "cuda:{}", index),
        }
    }
}

/// Array library that owns the storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    Torch,
    Numpy,
}

impl Library {
    pub const ALL: [Library; 2] = [Library::Torch, Library::Numpy];

    /// Lower-case token, as written in contracts
    pub fn as_str(self) -> &'static str {
        match self {
            Library::Torch => "torch",
            Library::Numpy => "numpy",
        }
    }
}

/// Capitalised, as it heads a rendered contract: `Torch(...)`
impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Library::Torch => f.write_str("Torch"),
            Library::Numpy => f.write_str("Numpy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_names() {
        let names: Vec<&str> = ElementType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            names,
            ["float16", "float32", "float64", "uint8", "int8", "int16", "int32", "int64"]
        );
    }

    #[test]
    fn test_device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Cuda(0).to_string(), "cuda:0");
    }

    #[test]
    fn test_library_display() {
        assert_eq!(Library::Torch.to_string(), "Torch");
        assert_eq!(Library::Numpy.as_str(), "numpy");
    }
}
