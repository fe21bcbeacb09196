//! Field compatibility
//!
//! One rule, applied to scalar fields and to every shape position alike:
//!
//! - a wildcard on either side is compatible
//! - a symbol against a concrete value is compatible (the value is a binding
//!   candidate for the symbol)
//! - otherwise both sides must be equal
//!
//! Symbols already known to be inconsistent (`excluded`) are never
//! compatible, so diagnostics can flag them even where a pairwise comparison
//! looks fine.
//!
//! Shapes of different rank never match, whatever wildcards they contain. Only
//! an entirely absent shape accepts any rank.

use std::collections::BTreeSet;
use tensorguard_model::prelude::*;

/// Compatibility of two slots of the same field
pub fn slot_compatible<T: PartialEq>(a: &Slot<T>, b: &Slot<T>, excluded: &BTreeSet<Symbol>) -> bool {
    if is_excluded(a, excluded) || is_excluded(b, excluded) {
        return false;
    }

    match (a, b) {
        (Slot::Any, _) | (_, Slot::Any) => true,
        (Slot::Symbol(x), Slot::Symbol(y)) => x == y,
        (Slot::Symbol(_), Slot::Value(_)) | (Slot::Value(_), Slot::Symbol(_)) => true,
        (Slot::Value(x), Slot::Value(y)) => x == y,
    }
}

/// True when the slot is a symbol in `excluded`
pub fn is_excluded<T>(slot: &Slot<T>, excluded: &BTreeSet<Symbol>) -> bool {
    slot.symbol().map_or(false, |sym| excluded.contains(&sym))
}

/// Compatibility of two shapes, position by position
pub fn shape_compatible(a: Option<&[Dim]>, b: Option<&[Dim]>, excluded: &BTreeSet<Symbol>) -> bool {
    match (a, b) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| slot_compatible(x, y, excluded))
        }
    }
}

/// Compatibility of one field of two contracts
pub fn field_compatible(a: &FieldRef<'_>, b: &FieldRef<'_>, excluded: &BTreeSet<Symbol>) -> bool {
    match (a, b) {
        (FieldRef::Shape(a), FieldRef::Shape(b)) => shape_compatible(*a, *b, excluded),
        (FieldRef::Scalar(a), FieldRef::Scalar(b)) => slot_compatible(a, b, excluded),
        // Different field kinds never describe the same thing
        _ => false,
    }
}

/// True when every field of `observed` satisfies `expected`
pub fn contract_matches(expected: &TensorContract, observed: &TensorContract) -> bool {
    let none = BTreeSet::new();
    FieldKind::ALL
        .iter()
        .all(|&kind| field_compatible(&expected.field(kind), &observed.field(kind), &none))
}

/// Fields of `this` that disagree with `other`, over the fields `other` declares
pub fn diff(this: &TensorContract, other: &TensorContract) -> BTreeSet<FieldKind> {
    let none = BTreeSet::new();
    FieldKind::ALL
        .iter()
        .copied()
        .filter(|&kind| {
            let theirs = other.field(kind);
            theirs.is_present() && !field_compatible(&theirs, &this.field(kind), &none)
        })
        .collect()
}
