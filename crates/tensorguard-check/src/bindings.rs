//! Symbol bindings collected during one call

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tensorguard_model::prelude::*;

/// A concrete value observed for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Binding {
    Size(u64),
    ElementType(ElementType),
    Device(Device),
    Library(Library),
}

impl From<Scalar> for Binding {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::ElementType(ty) => Binding::ElementType(ty),
            Scalar::Device(dev) => Binding::Device(dev),
            Scalar::Library(lib) => Binding::Library(lib),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Size(n) => write!(f, "{}", n),
            Binding::ElementType(ty) => write!(f, "{}", ty),
            Binding::Device(dev) => write!(f, "{}", dev),
            Binding::Library(lib) => write!(f, "{}", lib),
        }
    }
}

/// Candidate values per symbol, plus symbols referenced at missing positions
///
/// Created fresh for every call. A symbol is consistent when it has exactly
/// one candidate and is not malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    candidates: BTreeMap<Symbol, BTreeSet<Binding>>,
    malformed: BTreeSet<Symbol>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed value for `sym`
    pub fn record(&mut self, sym: Symbol, binding: Binding) {
        self.candidates.entry(sym).or_default().insert(binding);
    }

    /// `sym` sits at a shape position the observed value does not have
    pub fn mark_malformed(&mut self, sym: Symbol) {
        self.candidates.entry(sym).or_default();
        self.malformed.insert(sym);
    }

    pub fn candidates(&self, sym: Symbol) -> Option<&BTreeSet<Binding>> {
        self.candidates.get(&sym)
    }

    pub fn contains(&self, sym: Symbol) -> bool {
        self.candidates.contains_key(&sym)
    }

    pub fn is_malformed(&self, sym: Symbol) -> bool {
        self.malformed.contains(&sym)
    }

    pub fn is_consistent(&self, sym: Symbol) -> bool {
        !self.is_malformed(sym) && self.candidates(sym).map_or(false, |c| c.len() == 1)
    }

    /// The single value `sym` resolved to, if consistent
    pub fn resolve(&self, sym: Symbol) -> Option<Binding> {
        if !self.is_consistent(sym) {
            return None;
        }
        self.candidates(sym)?.iter().next().copied()
    }

    /// Symbols seen so far, in interning order
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.candidates.keys().copied()
    }

    /// Symbols with no value, several values, or a malformed reference
    pub fn inconsistent(&self) -> BTreeSet<Symbol> {
        self.symbols().filter(|&sym| !self.is_consistent(sym)).collect()
    }

    /// True when every symbol resolved to exactly one value
    pub fn is_consistent_all(&self) -> bool {
        self.symbols().all(|sym| self.is_consistent(sym))
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// `a = 4, T = float32, n = {3, 5}, k = <malformed>`
impl fmt::Display for BindingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (sym, values) in &self.candidates {
            if !first {
                f.write_str(", ")?;
            }
            first = false;

            if self.is_malformed(*sym) {
                write!(f, "{} = <malformed>", sym)?;
            } else if values.len() == 1 {
                let value = values.iter().next().map(ToString::to_string).unwrap_or_default();
                write!(f, "{} = {}", sym, value)?;
            } else {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} = {{{}}}", sym, values.join(", "))?;
            }
        }
        Ok(())
    }
}
