//! Symbol unification across one call
//!
//! Every contract/descriptor pair of a call feeds the same [`BindingTable`]:
//! each symbol in a contract collects the concrete value observed at its
//! position. A symbol shared by several parameters therefore collects one
//! candidate per occurrence, and is consistent only if they all agree.

use std::collections::BTreeSet;
use tensorguard_model::prelude::*;
use tracing::trace;

use crate::bindings::{Binding, BindingTable};

/// Record the bindings `observed` implies for the symbols of `expected`
pub fn collect_bindings(expected: &TensorContract, observed: &ConcreteDescriptor, table: &mut BindingTable) {
    if let Some(dims) = expected.shape() {
        for (position, dim) in dims.iter().enumerate() {
            let Some(sym) = dim.symbol() else { continue };
            match observed.shape.get(position) {
                Some(&size) => {
                    trace!(symbol = %sym, position, size, "bind dimension");
                    table.record(sym, Binding::Size(size));
                }
                None => {
                    trace!(symbol = %sym, position, rank = observed.rank(), "dimension missing");
                    table.mark_malformed(sym);
                }
            }
        }
    }

    let scalars = [
        (expected.dtype().symbol(), Binding::ElementType(observed.dtype)),
        (expected.device().symbol(), Binding::Device(observed.device)),
        (expected.library().symbol(), Binding::Library(observed.library)),
    ];
    for (sym, binding) in scalars {
        if let Some(sym) = sym {
            trace!(symbol = %sym, value = %binding, "bind field");
            table.record(sym, binding);
        }
    }
}

/// Accumulates bindings over the parameters and return value of one call
#[derive(Debug, Clone, Default)]
pub struct Unifier {
    table: BindingTable,
}

impl Unifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, expected: &TensorContract, observed: &ConcreteDescriptor) {
        collect_bindings(expected, observed, &mut self.table);
    }

    /// Symbols that currently fail to resolve to a single value
    pub fn excluded(&self) -> BTreeSet<Symbol> {
        self.table.inconsistent()
    }

    pub fn is_consistent(&self) -> bool {
        self.table.is_consistent_all()
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    pub fn into_table(self) -> BindingTable {
        self.table
    }
}
