//! Token registry
//!
//! Maps the tokens accepted in contracts and reported by adapters (`float32`,
//! `torch.half`, `cuda:1`, `np`, ...) to concrete metadata values. A registry
//! is built once and only read afterwards; [`Registry::global`] holds the
//! standard tables for the whole process.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::types::{Device, DeviceKind, ElementType, Library};

/// Prefixes stripped from element type tokens (`torch.float32`, `np.int8`)
const LIBRARY_PREFIXES: [&str; 3] = ["torch.", "numpy.", "np."];

/// Immutable token tables
#[derive(Debug, Clone)]
pub struct Registry {
    element_types: HashMap<Box<str>, ElementType>,
    devices: HashMap<Box<str>, DeviceKind>,
    libraries: HashMap<Box<str>, Library>,
}

impl Registry {
    /// The process-wide standard registry
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::standard)
    }

    /// Standard tables without extra aliases
    pub fn standard() -> Registry {
        Registry::builder().build()
    }

    /// Builder pre-populated with the standard tables
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Resolve an element type token
    pub fn element_type(&self, token: &str) -> Option<ElementType> {
        let token = normalize(token);
        let token = LIBRARY_PREFIXES
            .iter()
            .find_map(|prefix| token.strip_prefix(prefix))
            .unwrap_or(token.as_str());
        self.element_types.get(token).copied()
    }

    /// Resolve a device token: `cpu`, `cuda`, or `cuda:<index>`
    pub fn device(&self, token: &str) -> Option<Device> {
        let token = normalize(token);
        let (kind, index) = match token.split_once(':') {
            Some((kind, index)) => (kind, Some(index)),
            None => (token.as_str(), None),
        };

        match (self.devices.get(kind)?, index) {
            (DeviceKind::Cpu, None) => Some(Device::Cpu),
            (DeviceKind::Cpu, Some(_)) => None,
            (DeviceKind::Cuda, None) => Some(Device::Cuda(0)),
            (DeviceKind::Cuda, Some(index)) if is_digits(index) => index.parse().ok().map(Device::Cuda),
            (DeviceKind::Cuda, Some(_)) => None,
        }
    }

    /// Resolve a library token
    pub fn library(&self, token: &str) -> Option<Library> {
        self.libraries.get(normalize(token).as_str()).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Non-empty and ASCII digits only; `+1` and `-1` are not indices
pub(crate) fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn normalize(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}

/// Builder for a [`Registry`] with extra aliases
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    element_types: HashMap<Box<str>, ElementType>,
    devices: HashMap<Box<str>, DeviceKind>,
    libraries: HashMap<Box<str>, Library>,
}

impl RegistryBuilder {
    fn new() -> Self {
        let mut builder = RegistryBuilder {
            element_types: HashMap::new(),
            devices: HashMap::new(),
            libraries: HashMap::new(),
        };

        for ty in ElementType::ALL {
            builder = builder.element_type_alias(ty.as_str(), ty);
        }
        for (alias, ty) in [
            ("half", ElementType::Float16),
            ("float", ElementType::Float32),
            ("double", ElementType::Float64),
            ("byte", ElementType::Uint8),
            ("char", ElementType::Int8),
            ("short", ElementType::Int16),
            ("int", ElementType::Int64),
            ("long", ElementType::Int64),
        ] {
            builder = builder.element_type_alias(alias, ty);
        }

        for lib in Library::ALL {
            builder = builder.library_alias(lib.as_str(), lib);
        }
        builder = builder
            .library_alias("pytorch", Library::Torch)
            .library_alias("np", Library::Numpy);

        builder
            .device_alias("cpu", DeviceKind::Cpu)
            .device_alias("cuda", DeviceKind::Cuda)
    }

    pub fn element_type_alias(mut self, alias: &str, ty: ElementType) -> Self {
        self.element_types.insert(normalize(alias).into_boxed_str(), ty);
        self
    }

    pub fn library_alias(mut self, alias: &str, library: Library) -> Self {
        self.libraries.insert(normalize(alias).into_boxed_str(), library);
        self
    }

    pub fn device_alias(mut self, alias: &str, kind: DeviceKind) -> Self {
        self.devices.insert(normalize(alias).into_boxed_str(), kind);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            element_types: self.element_types,
            devices: self.devices,
            libraries: self.libraries,
        }
    }
}
