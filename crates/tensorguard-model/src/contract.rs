//! Tensor contracts
//!
//! A [`TensorContract`] declares what one parameter or return value must look
//! like: its shape, element type, device and library. Every field may be a
//! wildcard, a concrete value, or a named [`Symbol`] that has to resolve to
//! the same concrete value everywhere it appears within one call.
//!
//! Contracts are built from raw tokens ([`ContractSpec`]) against a
//! [`Registry`] and are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::descriptor::ConcreteDescriptor;
use crate::error::{ContractDefinitionError, ContractResult};
use crate::registry::{is_digits, Registry};
use crate::symbol::Symbol;
use crate::types::{Device, ElementType, Library};

// ============================================================================
// Slots
// ============================================================================

/// One contract field, or one position of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot<T> {
    /// Matches any value
    Any,
    /// Named placeholder, unified across the call
    Symbol(Symbol),
    /// Fixed concrete value
    Value(T),
}

impl<T> Slot<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Slot::Any)
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Slot::Symbol(sym) => Some(*sym),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Slot<U> {
        match self {
            Slot::Any => Slot::Any,
            Slot::Symbol(sym) => Slot::Symbol(sym),
            Slot::Value(v) => Slot::Value(f(v)),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Any => f.write_str("_"),
            Slot::Symbol(sym) => write!(f, "{}", sym),
            Slot::Value(v) => write!(f, "{}", v),
        }
    }
}

/// A shape position: fixed size, symbol, or per-position wildcard
pub type Dim = Slot<u64>;

/// Render a shape as `[10, n, _]`
pub fn format_shape(dims: &[Dim]) -> String {
    let dims: Vec<String> = dims.iter().map(ToString::to_string).collect();
    format!("[{}]", dims.join(", "))
}

// ============================================================================
// Fields
// ============================================================================

/// The contract fields, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    Shape,
    ElementType,
    Device,
    Library,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Shape,
        FieldKind::ElementType,
        FieldKind::Device,
        FieldKind::Library,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Shape => "shape",
            FieldKind::ElementType => "dtype",
            FieldKind::Device => "device",
            FieldKind::Library => "library",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete value of one of the scalar fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    ElementType(ElementType),
    Device(Device),
    Library(Library),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::ElementType(ty) => write!(f, "{}", ty),
            Scalar::Device(dev) => write!(f, "{}", dev),
            Scalar::Library(lib) => write!(f, "{}", lib),
        }
    }
}

/// Borrowed view of one field, tagged by how it is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    /// `None` accepts any shape of any rank
    Shape(Option<&'a [Dim]>),
    Scalar(Slot<Scalar>),
}

impl FieldRef<'_> {
    /// Absent fields are omitted from rendered contracts
    pub fn is_present(&self) -> bool {
        match self {
            FieldRef::Shape(shape) => shape.is_some(),
            FieldRef::Scalar(slot) => !slot.is_any(),
        }
    }
}

// ============================================================================
// Tensor Contract
// ============================================================================

/// Declared contract for one parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorContract {
    shape: Option<Vec<Dim>>,
    dtype: Slot<ElementType>,
    device: Slot<Device>,
    library: Slot<Library>,
}

impl TensorContract {
    /// Build a contract from raw tokens; any field may be absent
    pub fn new(
        registry: &Registry,
        shape: Option<&[DimSpec]>,
        dtype: Option<&FieldSpec>,
        device: Option<&FieldSpec>,
        library: Option<&FieldSpec>,
    ) -> ContractResult<Self> {
        let shape = shape
            .map(|dims| dims.iter().map(DimSpec::build).collect::<ContractResult<Vec<_>>>())
            .transpose()?;

        let dtype = match dtype {
            None => Slot::Any,
            Some(spec) => spec.build("dtype", |token| {
                registry.element_type(token).ok_or_else(|| {
                    ContractDefinitionError::UnsupportedElementType { value: token.to_string() }
                })
            })?,
        };

        let device = match device {
            None => Slot::Any,
            Some(spec) => spec.build("device", |token| {
                registry.device(token).ok_or_else(|| {
                    ContractDefinitionError::UnsupportedDevice { value: token.to_string() }
                })
            })?,
        };

        let library = match library {
            None => Slot::Any,
            Some(spec) => spec.build("library", |token| {
                registry.library(token).ok_or_else(|| {
                    ContractDefinitionError::UnsupportedLibrary { value: token.to_string() }
                })
            })?,
        };

        Ok(TensorContract { shape, dtype, device, library })
    }

    /// Contract with every field a wildcard
    pub fn any() -> Self {
        TensorContract {
            shape: None,
            dtype: Slot::Any,
            device: Slot::Any,
            library: Slot::Any,
        }
    }

    pub fn shape(&self) -> Option<&[Dim]> {
        self.shape.as_deref()
    }

    pub fn dtype(&self) -> Slot<ElementType> {
        self.dtype
    }

    pub fn device(&self) -> Slot<Device> {
        self.device
    }

    pub fn library(&self) -> Slot<Library> {
        self.library
    }

    pub fn field(&self, kind: FieldKind) -> FieldRef<'_> {
        match kind {
            FieldKind::Shape => FieldRef::Shape(self.shape()),
            FieldKind::ElementType => FieldRef::Scalar(self.dtype.map(Scalar::ElementType)),
            FieldKind::Device => FieldRef::Scalar(self.device.map(Scalar::Device)),
            FieldKind::Library => FieldRef::Scalar(self.library.map(Scalar::Library)),
        }
    }

    /// Every symbol mentioned anywhere in the contract
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let dims = self.shape.iter().flatten().filter_map(Slot::symbol);
        dims.chain(self.dtype.symbol())
            .chain(self.device.symbol())
            .chain(self.library.symbol())
            .collect()
    }
}

impl Default for TensorContract {
    fn default() -> Self {
        Self::any()
    }
}

/// The fully concrete contract an observed array satisfies exactly
impl From<&ConcreteDescriptor> for TensorContract {
    fn from(desc: &ConcreteDescriptor) -> Self {
        TensorContract {
            shape: Some(desc.shape.iter().map(|&n| Slot::Value(n)).collect()),
            dtype: Slot::Value(desc.dtype),
            device: Slot::Value(desc.device),
            library: Slot::Value(desc.library),
        }
    }
}

/// `Torch([10, n], float32, cpu)`; `Tensor(...)` when the library is open
impl fmt::Display for TensorContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(shape) = &self.shape {
            parts.push(format_shape(shape));
        }
        if !self.dtype.is_any() {
            parts.push(self.dtype.to_string());
        }
        if !self.device.is_any() {
            parts.push(self.device.to_string());
        }

        match self.library {
            Slot::Any => write!(f, "Tensor({})", parts.join(", ")),
            library => write!(f, "{}({})", library, parts.join(", ")),
        }
    }
}

// ============================================================================
// Raw Tokens
// ============================================================================

/// Raw shape position: integer size, symbol name, or `null` wildcard
///
/// Numeric strings (`"10"`) are sizes and `"_"` is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimSpec {
    Size(i64),
    Name(String),
    Any,
}

impl DimSpec {
    fn build(&self) -> ContractResult<Dim> {
        match self {
            DimSpec::Size(n) => fixed_dim(*n),
            DimSpec::Any => Ok(Slot::Any),
            DimSpec::Name(name) => {
                let name = name.trim();
                if name == "_" {
                    return Ok(Slot::Any);
                }
                if is_digits(name) {
                    return name
                        .parse::<i64>()
                        .map_err(|_| ContractDefinitionError::InvalidDimension { value: name.to_string() })
                        .and_then(fixed_dim);
                }
                if name.is_empty() {
                    return Err(ContractDefinitionError::EmptySymbol { field: "shape" });
                }
                if !is_symbol_name(name) {
                    return Err(ContractDefinitionError::InvalidDimension { value: name.to_string() });
                }
                Ok(Slot::Symbol(Symbol::intern(name)))
            }
        }
    }
}

fn fixed_dim(n: i64) -> ContractResult<Dim> {
    match n {
        0 => Err(ContractDefinitionError::ZeroDimension),
        n if n < 0 => Err(ContractDefinitionError::InvalidDimension { value: n.to_string() }),
        n => Ok(Slot::Value(n as u64)),
    }
}

fn is_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

impl From<i32> for DimSpec {
    fn from(n: i32) -> Self {
        DimSpec::Size(n.into())
    }
}

impl From<i64> for DimSpec {
    fn from(n: i64) -> Self {
        DimSpec::Size(n)
    }
}

impl From<&str> for DimSpec {
    fn from(name: &str) -> Self {
        DimSpec::Name(name.to_string())
    }
}

impl<T: Into<DimSpec>> From<Option<T>> for DimSpec {
    fn from(dim: Option<T>) -> Self {
        dim.map_or(DimSpec::Any, Into::into)
    }
}

/// Raw scalar field: a token, or `{"symbol": name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Value(String),
    Symbol { symbol: String },
}

impl FieldSpec {
    pub fn symbol(name: impl Into<String>) -> Self {
        FieldSpec::Symbol { symbol: name.into() }
    }

    fn build<T>(
        &self,
        field: &'static str,
        resolve: impl FnOnce(&str) -> ContractResult<T>,
    ) -> ContractResult<Slot<T>> {
        match self {
            FieldSpec::Value(token) => resolve(token).map(Slot::Value),
            FieldSpec::Symbol { symbol } => {
                let name = symbol.trim();
                if name.is_empty() {
                    return Err(ContractDefinitionError::EmptySymbol { field });
                }
                Ok(Slot::Symbol(Symbol::intern(name)))
            }
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(token: &str) -> Self {
        FieldSpec::Value(token.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(token: String) -> Self {
        FieldSpec::Value(token)
    }
}

impl From<ElementType> for FieldSpec {
    fn from(ty: ElementType) -> Self {
        FieldSpec::Value(ty.as_str().to_string())
    }
}

impl From<Device> for FieldSpec {
    fn from(dev: Device) -> Self {
        FieldSpec::Value(dev.to_string())
    }
}

impl From<Library> for FieldSpec {
    fn from(lib: Library) -> Self {
        FieldSpec::Value(lib.as_str().to_string())
    }
}

/// Unvalidated contract, as written in a declaration or a JSON call file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<DimSpec>>,
    #[serde(alias = "element_type", skip_serializing_if = "Option::is_none")]
    pub dtype: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<FieldSpec>,
}

impl ContractSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape<I, D>(mut self, dims: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DimSpec>,
    {
        self.shape = Some(dims.into_iter().map(Into::into).collect());
        self
    }

    pub fn dtype(mut self, dtype: impl Into<FieldSpec>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn device(mut self, device: impl Into<FieldSpec>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn library(mut self, library: impl Into<FieldSpec>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn build(&self, registry: &Registry) -> ContractResult<TensorContract> {
        TensorContract::new(
            registry,
            self.shape.as_deref(),
            self.dtype.as_ref(),
            self.device.as_ref(),
            self.library.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> &'static Registry {
        Registry::global()
    }

    #[test]
    fn test_build_full_contract() {
        let c = ContractSpec::new()
            .shape([10, 4, 3])
            .dtype("float32")
            .device("cpu")
            .library("torch")
            .build(reg())
            .unwrap();

        assert_eq!(c.shape(), Some(&[Slot::Value(10), Slot::Value(4), Slot::Value(3)][..]));
        assert_eq!(c.dtype(), Slot::Value(ElementType::Float32));
        assert_eq!(c.device(), Slot::Value(Device::Cpu));
        assert_eq!(c.library(), Slot::Value(Library::Torch));
        assert!(c.symbols().is_empty());
        assert_eq!(c.to_string(), "Torch([10, 4, 3], float32, cpu)");
    }

    #[test]
    fn test_absent_fields_are_wildcards() {
        let c = ContractSpec::new().dtype("half").build(reg()).unwrap();
        assert_eq!(c.shape(), None);
        assert!(c.device().is_any());
        assert!(c.library().is_any());
        assert_eq!(c.to_string(), "Tensor(float16)");
        assert_eq!(TensorContract::any().to_string(), "Tensor()");
    }

    #[test]
    fn test_symbolic_dims() {
        let c = ContractSpec::new()
            .shape([DimSpec::from("bs"), 3.into(), "224".into(), DimSpec::Any])
            .build(reg())
            .unwrap();

        let bs = Symbol::intern("bs");
        assert_eq!(
            c.shape(),
            Some(&[Slot::Symbol(bs), Slot::Value(3), Slot::Value(224), Slot::Any][..])
        );
        assert_eq!(c.symbols().into_iter().collect::<Vec<_>>(), vec![bs]);
        assert_eq!(c.to_string(), "Tensor([bs, 3, 224, _])");
    }

    #[test]
    fn test_optional_dims() {
        let c = ContractSpec::new()
            .shape([None, Some(2), Some(3)])
            .build(reg())
            .unwrap();
        assert_eq!(c.shape(), Some(&[Slot::Any, Slot::Value(2), Slot::Value(3)][..]));
    }

    #[test]
    fn test_cuda_normalizes() {
        let c = ContractSpec::new().device("cuda").build(reg()).unwrap();
        assert_eq!(c.device(), Slot::Value(Device::Cuda(0)));
        assert_eq!(c.to_string(), "Tensor(cuda:0)");
    }

    #[test]
    fn test_symbolic_scalar_fields() {
        let c = ContractSpec::new()
            .dtype(FieldSpec::symbol("T"))
            .device(FieldSpec::symbol("D"))
            .build(reg())
            .unwrap();
        let t = Symbol::intern("T");
        let d = Symbol::intern("D");
        assert_eq!(c.dtype(), Slot::Symbol(t));
        assert_eq!(c.device(), Slot::Symbol(d));
        assert_eq!(c.symbols().len(), 2);
        assert_eq!(c.field(FieldKind::ElementType), FieldRef::Scalar(Slot::Symbol(t)));
    }

    #[test]
    fn test_invalid_dimensions() {
        let zero = ContractSpec::new().shape([0, 3]).build(reg());
        assert_eq!(zero, Err(ContractDefinitionError::ZeroDimension));

        let negative = ContractSpec::new().shape([-2]).build(reg());
        assert_eq!(
            negative,
            Err(ContractDefinitionError::InvalidDimension { value: "-2".into() })
        );

        let bad = ContractSpec::new().shape(["3.5"]).build(reg());
        assert_eq!(bad, Err(ContractDefinitionError::InvalidDimension { value: "3.5".into() }));

        for signed in ["+3", "-3"] {
            let err = ContractSpec::new().shape([signed]).build(reg());
            assert_eq!(err, Err(ContractDefinitionError::InvalidDimension { value: signed.into() }));
        }

        let huge = ContractSpec::new().shape(["99999999999999999999"]).build(reg());
        assert!(matches!(huge, Err(ContractDefinitionError::InvalidDimension { .. })));

        let empty = ContractSpec::new().shape([" "]).build(reg());
        assert_eq!(empty, Err(ContractDefinitionError::EmptySymbol { field: "shape" }));
    }

    #[test]
    fn test_unsupported_tokens() {
        let dtype = ContractSpec::new().dtype("complex64").build(reg());
        assert_eq!(
            dtype,
            Err(ContractDefinitionError::UnsupportedElementType { value: "complex64".into() })
        );

        let device = ContractSpec::new().device("tpu:0").build(reg());
        assert!(matches!(device, Err(ContractDefinitionError::UnsupportedDevice { .. })));

        let library = ContractSpec::new().library("jax").build(reg());
        let err = library.unwrap_err();
        assert!(err.to_string().contains("jax"));
        assert!(err.to_string().contains("library"));

        let symbol = ContractSpec::new().device(FieldSpec::symbol("")).build(reg());
        assert_eq!(symbol, Err(ContractDefinitionError::EmptySymbol { field: "device" }));
    }

    #[test]
    fn test_lift_descriptor() {
        let desc = ConcreteDescriptor::new(
            vec![2, 0],
            ElementType::Uint8,
            Device::Cuda(1),
            Library::Numpy,
        );
        let c = TensorContract::from(&desc);
        assert!(c.symbols().is_empty());
        assert_eq!(c.to_string(), "Numpy([2, 0], uint8, cuda:1)");
    }

    #[test]
    fn test_spec_json() {
        let json = r#"{"shape": ["bs", 3, null], "dtype": {"symbol": "T"}, "device": "cuda:1"}"#;
        let spec: ContractSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec.shape,
            Some(vec![DimSpec::Name("bs".into()), DimSpec::Size(3), DimSpec::Any])
        );
        assert_eq!(spec.dtype, Some(FieldSpec::symbol("T")));

        let c = spec.build(reg()).unwrap();
        assert_eq!(c.to_string(), "Tensor([bs, 3, _], T, cuda:1)");
    }
}
