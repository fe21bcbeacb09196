//! Diagnostic rendering
//!
//! Renders a failed call as an "expected vs realized" report:
//!
//! ```text
//! Expected args: x: Tensor([*d0*, 3, 224, 224], *float16*), y: Tensor([*d0*], int64)
//! Realized args: x: Torch([*128*, 3, 224, 224], *float32*, cpu), y: Torch([*256*], int64, cpu)
//! ```
//!
//! Only the fields and shape positions responsible for the failure are
//! highlighted. A rank mismatch highlights the whole shape.

use colored::Colorize;
use std::collections::BTreeSet;
use tensorguard_model::contract::format_shape;
use tensorguard_model::prelude::*;

use crate::check::{CallVerdict, CheckedParam, Failure, FailureSite, Observed};
use crate::matcher::{is_excluded, slot_compatible};

/// How highlighted fields are marked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    /// `*field*`
    #[default]
    Plain,
    /// Bold, underlined, on red
    Ansi,
}

/// Render configuration
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub highlight: Highlight,
}

impl RenderConfig {
    pub fn plain() -> Self {
        RenderConfig {
            highlight: Highlight::Plain,
        }
    }

    pub fn ansi() -> Self {
        RenderConfig {
            highlight: Highlight::Ansi,
        }
    }

    /// Mark `text` as responsible for the failure
    pub fn highlight(&self, text: &str) -> String {
        match self.highlight {
            Highlight::Plain => format!("*{}*", text),
            Highlight::Ansi => text.on_red().underline().bold().to_string(),
        }
    }

    fn mark(&self, text: String, bad: bool) -> String {
        if bad {
            self.highlight(&text)
        } else {
            text
        }
    }

    fn heading(&self, text: &str) -> String {
        match self.highlight {
            Highlight::Plain => text.to_string(),
            Highlight::Ansi => text.bold().to_string(),
        }
    }

    fn name(&self, text: &str) -> String {
        match self.highlight {
            Highlight::Plain => text.to_string(),
            Highlight::Ansi => text.underline().to_string(),
        }
    }
}

// ============================================================================
// Contract Diffs
// ============================================================================

/// Render `this`, highlighting what disagrees with `other`
///
/// Fields absent from `this` are omitted; the library heads the rendering
/// (`Tensor` when absent).
pub fn render_diff(
    this: &TensorContract,
    other: &TensorContract,
    excluded: &BTreeSet<Symbol>,
    config: &RenderConfig,
) -> String {
    let mut parts = Vec::new();

    if let Some(shape) = this.shape() {
        parts.push(render_shape(shape, other.shape(), excluded, config));
    }

    let scalars = [
        (this.dtype().map(Scalar::ElementType), other.dtype().map(Scalar::ElementType)),
        (this.device().map(Scalar::Device), other.device().map(Scalar::Device)),
    ];
    for (mine, theirs) in scalars {
        if !mine.is_any() {
            parts.push(render_scalar(mine, theirs, excluded, config));
        }
    }

    let library = this.library().map(Scalar::Library);
    let head = if library.is_any() {
        "Tensor".to_string()
    } else {
        render_scalar(library, other.library().map(Scalar::Library), excluded, config)
    };

    format!("{}({})", head, parts.join(", "))
}

fn render_shape(
    mine: &[Dim],
    theirs: Option<&[Dim]>,
    excluded: &BTreeSet<Symbol>,
    config: &RenderConfig,
) -> String {
    match theirs {
        Some(theirs) if theirs.len() != mine.len() => config.highlight(&format_shape(mine)),
        Some(theirs) => {
            let dims: Vec<String> = mine
                .iter()
                .zip(theirs)
                .map(|(d, t)| config.mark(d.to_string(), !slot_compatible(d, t, excluded)))
                .collect();
            format!("[{}]", dims.join(", "))
        }
        None => {
            let dims: Vec<String> = mine
                .iter()
                .map(|d| config.mark(d.to_string(), is_excluded(d, excluded)))
                .collect();
            format!("[{}]", dims.join(", "))
        }
    }
}

/// An absent field on the other side is a wildcard, so only excluded symbols flag
fn render_scalar(
    mine: Slot<Scalar>,
    theirs: Slot<Scalar>,
    excluded: &BTreeSet<Symbol>,
    config: &RenderConfig,
) -> String {
    config.mark(mine.to_string(), !slot_compatible(&mine, &theirs, excluded))
}

// ============================================================================
// Reports
// ============================================================================

/// Full report for a failed call
pub fn render_failure(failure: &Failure, config: &RenderConfig) -> String {
    let excluded = failure.excluded();
    let mut out = render_block("args", failure.params(), excluded, config);

    if failure.site() == FailureSite::Return {
        if let Some(ret) = failure.ret() {
            out.push_str("\n\n");
            out.push_str(&render_block("return", std::slice::from_ref(ret), excluded, config));
        }
    }

    if !failure.conversion_errors().is_empty() {
        out.push_str("\n\n");
        out.push_str(&config.heading("Type inference errors:"));
        for err in failure.conversion_errors() {
            out.push_str(&format!("\n- {}", err));
        }
    }

    out
}

/// Report for a verdict; `None` when the call passed
pub fn report_string(verdict: &CallVerdict, config: &RenderConfig) -> Option<String> {
    verdict.failure().map(|failure| render_failure(failure, config))
}

fn render_block(
    label: &str,
    params: &[CheckedParam],
    excluded: &BTreeSet<Symbol>,
    config: &RenderConfig,
) -> String {
    let expected: Vec<String> = params
        .iter()
        .map(|p| format!("{}: {}", config.name(&p.name), render_expected(p, excluded, config)))
        .collect();
    let realized: Vec<String> = params
        .iter()
        .map(|p| format!("{}: {}", config.name(&p.name), render_realized(p, excluded, config)))
        .collect();

    format!(
        "{}: {}\n{}: {}",
        config.heading(&format!("Expected {}", label)),
        expected.join(", "),
        config.heading(&format!("Realized {}", label)),
        realized.join(", "),
    )
}

fn render_expected(param: &CheckedParam, excluded: &BTreeSet<Symbol>, config: &RenderConfig) -> String {
    let Some(contract) = &param.contract else {
        return "_".to_string();
    };

    match &param.observed {
        Observed::Descriptor(desc) => render_diff(contract, &TensorContract::from(desc), excluded, config),
        Observed::Unconvertible { .. } => config.highlight(&contract.to_string()),
        Observed::Unchecked { .. } | Observed::Missing => contract.to_string(),
    }
}

fn render_realized(param: &CheckedParam, excluded: &BTreeSet<Symbol>, config: &RenderConfig) -> String {
    match &param.observed {
        Observed::Descriptor(desc) => {
            let lifted = TensorContract::from(desc);
            match &param.contract {
                Some(contract) => render_diff(&lifted, contract, excluded, config),
                None => lifted.to_string(),
            }
        }
        Observed::Unconvertible { type_name } => config.highlight(type_name),
        Observed::Unchecked { type_name } => type_name.clone(),
        Observed::Missing => "<missing>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check_call;

    fn contract(spec: ContractSpec) -> TensorContract {
        spec.build(Registry::global()).unwrap()
    }

    fn base() -> TensorContract {
        contract(ContractSpec::new().shape([10, 4, 3]).dtype("float32").device("cpu").library("torch"))
    }

    fn plain(this: &TensorContract, other: &TensorContract) -> String {
        render_diff(this, other, &BTreeSet::new(), &RenderConfig::plain())
    }

    #[test]
    fn test_render_no_diff() {
        let a = base();
        assert_eq!(plain(&a, &a), "Torch([10, 4, 3], float32, cpu)");
    }

    #[test]
    fn test_render_shape_position() {
        let a = base();
        let b = contract(ContractSpec::new().shape([5, 4, 3]).dtype("float32").device("cpu").library("torch"));
        assert_eq!(plain(&a, &b), "Torch([*10*, 4, 3], float32, cpu)");
        assert_eq!(plain(&b, &a), "Torch([*5*, 4, 3], float32, cpu)");
    }

    #[test]
    fn test_render_rank_mismatch_whole_shape() {
        let a = contract(ContractSpec::new().shape([2, 3]));
        let b = contract(ContractSpec::new().shape([2, 3, 4]));
        assert_eq!(plain(&a, &b), "Tensor(*[2, 3]*)");
        assert_eq!(plain(&b, &a), "Tensor(*[2, 3, 4]*)");
    }

    #[test]
    fn test_render_scalar_fields() {
        let a = base();
        let dtype = contract(ContractSpec::new().shape([10, 4, 3]).dtype("uint8").device("cpu").library("torch"));
        let device = contract(ContractSpec::new().shape([10, 4, 3]).dtype("float32").device("cuda").library("torch"));
        let library = contract(ContractSpec::new().shape([10, 4, 3]).dtype("float32").device("cpu").library("numpy"));

        assert_eq!(plain(&a, &dtype), "Torch([10, 4, 3], *float32*, cpu)");
        assert_eq!(plain(&device, &a), "Torch([10, 4, 3], float32, *cuda:0*)");
        assert_eq!(plain(&library, &a), "*Numpy*([10, 4, 3], float32, cpu)");
    }

    #[test]
    fn test_render_absent_fields_omitted() {
        let a = base();
        let open = contract(ContractSpec::new().dtype("float32"));
        assert_eq!(plain(&open, &a), "Tensor(float32)");
        assert_eq!(plain(&a, &open), "Torch([10, 4, 3], float32, cpu)");
    }

    #[test]
    fn test_render_excluded_symbols() {
        let n = Symbol::intern("n");
        let expected = contract(ContractSpec::new().shape(["n", "2"]));
        let observed = contract(ContractSpec::new().shape([7, 2]));
        let excluded = BTreeSet::from([n]);
        let config = RenderConfig::plain();

        assert_eq!(render_diff(&expected, &observed, &excluded, &config), "Tensor([*n*, 2])");
        assert_eq!(render_diff(&observed, &expected, &excluded, &config), "Tensor([*7*, 2])");
        assert_eq!(render_diff(&expected, &observed, &BTreeSet::new(), &config), "Tensor([n, 2])");

        // Excluded symbols are flagged even without a counterpart
        assert_eq!(render_diff(&expected, &TensorContract::any(), &excluded, &config), "Tensor([*n*, 2])");
    }

    #[test]
    fn test_render_excluded_scalar_symbols() {
        let t = Symbol::intern("T");
        let lib = Symbol::intern("Lib");
        let symbolic = contract(
            ContractSpec::new()
                .dtype(FieldSpec::symbol("T"))
                .device("cpu")
                .library(FieldSpec::symbol("Lib")),
        );
        let open = TensorContract::any();
        let config = RenderConfig::plain();

        assert_eq!(render_diff(&symbolic, &open, &BTreeSet::new(), &config), "Lib(T, cpu)");
        assert_eq!(
            render_diff(&symbolic, &open, &BTreeSet::from([t, lib]), &config),
            "*Lib*(*T*, cpu)"
        );
        assert_eq!(
            render_diff(&symbolic, &base(), &BTreeSet::from([t]), &config),
            "Lib(*T*, cpu)"
        );
    }

    #[test]
    fn test_ansi_highlight() {
        colored::control::set_override(true);
        let config = RenderConfig::ansi();
        let marked = config.highlight("float32");
        assert!(marked.contains("float32"));
        assert!(marked.starts_with("\u{1b}["));
        assert_ne!(marked, RenderConfig::plain().highlight("float32"));
    }

    #[test]
    fn test_report_layout() {
        let sig = Signature::new()
            .param("x", contract(ContractSpec::new().shape(["n"]).dtype("float32")))
            .untyped_param("scale")
            .param("y", contract(ContractSpec::new().shape(["n"])));
        let x = Value::array(vec![3], "float32", "cpu", "torch");
        let scale = Value::other("float", "0.5");
        let y = Value::other("list", "[1, 2, 3]");

        let verdict = check_call(
            &sig,
            Registry::global(),
            [("x", &x), ("scale", &scale), ("y", &y)],
            None,
        );
        let report = report_string(&verdict, &RenderConfig::plain()).unwrap();

        assert_eq!(
            report,
            "Expected args: x: Tensor([n], float32), scale: _, y: *Tensor([n])*\n\
             Realized args: x: Torch([3], float32, cpu), scale: float, y: *list*\n\
             \n\
             Type inference errors:\n\
             - y(list is not an array-like value): '[1, 2, 3]'"
        );
    }

    #[test]
    fn test_report_return_block() {
        let sig = Signature::new()
            .param("x", contract(ContractSpec::new().shape(["n"])))
            .returns(contract(ContractSpec::new().shape(["n"]).dtype("int64")));
        let x = Value::array(vec![3], "float32", "cpu", "torch");
        let out = Value::array(vec![3], "float32", "cpu", "torch");

        let verdict = check_call(&sig, Registry::global(), [("x", &x)], Some(&out));
        let report = report_string(&verdict, &RenderConfig::plain()).unwrap();

        assert_eq!(
            report,
            "Expected args: x: Tensor([n])\n\
             Realized args: x: Torch([3], float32, cpu)\n\
             \n\
             Expected return: return: Tensor([n], *int64*)\n\
             Realized return: return: Torch([3], *float32*, cpu)"
        );
    }

    #[test]
    fn test_report_none_on_pass() {
        let sig = Signature::new().param("x", TensorContract::any());
        let x = Value::array(vec![1], "float32", "cpu", "torch");
        let verdict = check_call(&sig, Registry::global(), [("x", &x)], None);
        assert_eq!(report_string(&verdict, &RenderConfig::plain()), None);
    }
}
