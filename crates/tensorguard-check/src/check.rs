//! Call checking
//!
//! Checks one call of a guarded function in two phases. Arguments are checked
//! first, in declaration order, all feeding one [`Unifier`]; they pass when
//! every tensor parameter matches its contract and every symbol resolved to a
//! single value. Only then is the return value checked, against the same
//! bindings.
//!
//! A call fails whenever any symbol is inconsistent at the point a verdict is
//! reached, for arguments and return value alike.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tensorguard_model::prelude::*;
use tracing::{debug, trace};

use crate::bindings::BindingTable;
use crate::error::{ContractViolation, ConversionError};
use crate::matcher::{contract_matches, diff};
use crate::render::{render_failure, RenderConfig};
use crate::unify::Unifier;

/// What was observed for one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Descriptor(ConcreteDescriptor),
    /// The adapter could not describe the value
    Unconvertible { type_name: String },
    /// The parameter has no tensor contract
    Unchecked { type_name: String },
    /// No value was supplied
    Missing,
}

/// One parameter (or the return value) after checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedParam {
    pub name: String,
    pub contract: Option<TensorContract>,
    pub observed: Observed,
    /// Field-by-field result, ignoring symbol consistency
    pub matched: bool,
}

impl CheckedParam {
    /// Contract fields the observed value disagrees with
    pub fn mismatched_fields(&self) -> BTreeSet<FieldKind> {
        match (&self.contract, &self.observed) {
            (Some(contract), Observed::Descriptor(desc)) => diff(&TensorContract::from(desc), contract),
            _ => BTreeSet::new(),
        }
    }
}

/// Where a failed call broke its contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSite {
    Arguments,
    Return,
}

/// Everything needed to explain a failed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    site: FailureSite,
    params: Vec<CheckedParam>,
    ret: Option<CheckedParam>,
    excluded: BTreeSet<Symbol>,
    conversion_errors: Vec<ConversionError>,
    bindings: BindingTable,
}

impl Failure {
    pub fn site(&self) -> FailureSite {
        self.site
    }

    pub fn params(&self) -> &[CheckedParam] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&CheckedParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// The checked return value, when the failure is at the return
    pub fn ret(&self) -> Option<&CheckedParam> {
        self.ret.as_ref()
    }

    /// Symbols that did not resolve to a single value
    pub fn excluded(&self) -> &BTreeSet<Symbol> {
        &self.excluded
    }

    pub fn conversion_errors(&self) -> &[ConversionError] {
        &self.conversion_errors
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Multi-line "expected vs realized" report
    pub fn report(&self, config: &RenderConfig) -> String {
        render_failure(self, config)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report(&RenderConfig::plain()))
    }
}

/// Outcome of checking one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallVerdict {
    /// Resolved symbol bindings
    Pass(BindingTable),
    Fail(Box<Failure>),
}

impl CallVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, CallVerdict::Pass(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            CallVerdict::Pass(_) => None,
            CallVerdict::Fail(failure) => Some(failure),
        }
    }

    /// Turn a failed verdict into an error carrying the plain-text report
    pub fn into_result(self) -> Result<BindingTable, ContractViolation> {
        match self {
            CallVerdict::Pass(bindings) => Ok(bindings),
            CallVerdict::Fail(failure) => {
                let message = failure.report(&RenderConfig::plain());
                Err(ContractViolation::new(message, failure))
            }
        }
    }
}

// ============================================================================
// Checker
// ============================================================================

/// A call whose arguments passed, awaiting its return value
#[derive(Debug)]
pub struct CallCheck<'s> {
    signature: &'s Signature,
    registry: &'s Registry,
    unifier: Unifier,
    params: Vec<CheckedParam>,
    conversion_errors: Vec<ConversionError>,
}

impl<'s> CallCheck<'s> {
    /// Check the supplied arguments against the signature's parameters
    pub fn check_arguments<'v, V, I>(
        signature: &'s Signature,
        registry: &'s Registry,
        args: I,
    ) -> Result<Self, Box<Failure>>
    where
        V: Describe + ?Sized + 'v,
        I: IntoIterator<Item = (&'v str, &'v V)>,
    {
        let args: HashMap<&str, &V> = args.into_iter().collect();
        debug!(params = signature.params().len(), supplied = args.len(), "checking arguments");

        let mut call = CallCheck {
            signature,
            registry,
            unifier: Unifier::new(),
            params: Vec::with_capacity(signature.params().len()),
            conversion_errors: Vec::new(),
        };

        let mut matched = true;
        for param in signature.params() {
            let value = args.get(param.name.as_str()).copied();
            let checked = call.check_param(&param.name, param.contract.as_ref(), value);
            matched &= checked.matched;
            call.params.push(checked);
        }

        let excluded = call.unifier.excluded();
        if matched && excluded.is_empty() {
            debug!("arguments satisfy their contracts");
            Ok(call)
        } else {
            debug!(matched, inconsistent = excluded.len(), "arguments violate their contracts");
            Err(Box::new(call.into_failure(FailureSite::Arguments, None)))
        }
    }

    /// Check the return value, reusing the argument bindings
    pub fn check_return<V: Describe + ?Sized>(mut self, value: &V) -> CallVerdict {
        let signature = self.signature;
        let Some(contract) = signature.ret() else {
            return CallVerdict::Pass(self.into_bindings());
        };

        let fresh: Vec<&str> = contract
            .symbols()
            .into_iter()
            .filter(|&sym| !self.unifier.table().contains(sym))
            .map(Symbol::as_str)
            .collect();
        if !fresh.is_empty() {
            debug!(symbols = ?fresh, "return contract introduces symbols unbound by arguments");
        }

        let checked = self.check_param("return", Some(contract), Some(value));
        let excluded = self.unifier.excluded();
        if checked.matched && excluded.is_empty() {
            debug!("return value satisfies its contract");
            CallVerdict::Pass(self.into_bindings())
        } else {
            debug!(matched = checked.matched, inconsistent = excluded.len(), "return value violates its contract");
            CallVerdict::Fail(Box::new(self.into_failure(FailureSite::Return, Some(checked))))
        }
    }

    /// Bindings resolved so far
    pub fn bindings(&self) -> &BindingTable {
        self.unifier.table()
    }

    pub fn into_bindings(self) -> BindingTable {
        self.unifier.into_table()
    }

    fn check_param<V: Describe + ?Sized>(
        &mut self,
        name: &str,
        contract: Option<&TensorContract>,
        value: Option<&V>,
    ) -> CheckedParam {
        let (observed, matched) = match (contract, value) {
            (_, None) => (Observed::Missing, true),
            (None, Some(value)) => (
                Observed::Unchecked {
                    type_name: value.type_name(self.registry).into_owned(),
                },
                true,
            ),
            (Some(contract), Some(value)) => match value.describe(self.registry) {
                Ok(desc) => {
                    self.unifier.bind(contract, &desc);
                    let lifted = TensorContract::from(&desc);
                    let matched = contract_matches(contract, &lifted);
                    if !matched {
                        let fields: Vec<&str> = diff(&lifted, contract).into_iter().map(FieldKind::as_str).collect();
                        trace!(param = name, ?fields, "field mismatch");
                    }
                    (Observed::Descriptor(desc), matched)
                }
                Err(cause) => {
                    debug!(param = name, %cause, "value cannot be described");
                    self.conversion_errors.push(ConversionError {
                        parameter: name.to_string(),
                        cause,
                        value: value.repr(),
                    });
                    (
                        Observed::Unconvertible {
                            type_name: value.type_name(self.registry).into_owned(),
                        },
                        false,
                    )
                }
            },
        };

        CheckedParam {
            name: name.to_string(),
            contract: contract.cloned(),
            observed,
            matched,
        }
    }

    fn into_failure(self, site: FailureSite, ret: Option<CheckedParam>) -> Failure {
        let excluded = self.unifier.excluded();
        Failure {
            site,
            params: self.params,
            ret,
            excluded,
            conversion_errors: self.conversion_errors,
            bindings: self.unifier.into_table(),
        }
    }
}

/// Check a whole call: arguments, then the return value if one is given
pub fn check_call<'v, V, I>(
    signature: &Signature,
    registry: &Registry,
    args: I,
    ret_value: Option<&V>,
) -> CallVerdict
where
    V: Describe + ?Sized + 'v,
    I: IntoIterator<Item = (&'v str, &'v V)>,
{
    match CallCheck::check_arguments(signature, registry, args) {
        Err(failure) => CallVerdict::Fail(failure),
        Ok(call) => match ret_value {
            Some(value) => call.check_return(value),
            None => CallVerdict::Pass(call.into_bindings()),
        },
    }
}
