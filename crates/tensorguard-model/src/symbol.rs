//! Interned symbolic placeholders
//!
//! A symbol is a named wildcard that must resolve to one concrete value
//! across all of its occurrences within a single checked call. Symbols are
//! interned once, so equality and set membership compare a small integer
//! handle instead of strings.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{OnceLock, PoisonError, RwLock};

/// Interned symbol name
#[derive(Clone, Copy)]
pub struct Symbol {
    id: u32,
    name: &'static str,
}

impl Symbol {
    /// Intern `name`, returning the same handle for every equal name
    pub fn intern(name: &str) -> Symbol {
        let interner = interner();

        if let Some(sym) = interner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return sym;
        }

        interner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name)
    }

    /// Display name
    pub fn as_str(self) -> &'static str {
        self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}#{})", self.name, self.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::intern(name)
    }
}

// ============================================================================
// Interner
// ============================================================================

#[derive(Default)]
struct Interner {
    symbols: HashMap<&'static str, Symbol>,
}

impl Interner {
    fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    fn insert(&mut self, name: &str) -> Symbol {
        // Another writer may have won the race between the read and write locks
        if let Some(sym) = self.get(name) {
            return sym;
        }

        // Names live for the whole process, like the contracts that use them
        let name: &'static str = Box::leak(name.to_owned().into_boxed_str());
        let sym = Symbol {
            id: self.symbols.len() as u32,
            name,
        };
        self.symbols.insert(name, sym);
        sym
    }
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| RwLock::new(Interner::default()))
}
