//! Tensorguard CLI
//!
//! Usage:
//!   tensorguard <call.json>   - Check a call file
//!   tensorguard -e <json>     - Check a call given inline
//!   tensorguard < call.json   - Check a call read from stdin
//!
//! Exit status is 0 when the call satisfies its contracts, 1 on a contract
//! violation and 2 when the call file itself is invalid.

use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tensorguard_check::{check_call, CallVerdict, RenderConfig};
use tensorguard_model::prelude::*;
use tensorguard_model::ser::{CallSpec, SerError};
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(name = "tensorguard")]
#[command(version)]
#[command(about = "Check a call against its tensor contracts", long_about = None)]
struct Args {
    /// Call file to check
    #[arg()]
    file: Option<PathBuf>,

    /// Check a call given as inline JSON
    #[arg(short, long)]
    eval: Option<String>,

    /// When to highlight mismatches with terminal colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled(self) -> bool {
        match self {
            ColorMode::Auto => io::stdout().is_terminal(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let color = args.color.enabled();
    colored::control::set_override(color);
    let config = if color { RenderConfig::ansi() } else { RenderConfig::plain() };

    let call = match load_call(&args) {
        Ok(call) => call,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    match run_call(&call, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn load_call(args: &Args) -> Result<CallSpec, SerError> {
    if let Some(json) = &args.eval {
        debug!("reading call from --eval");
        ser::from_json(json)
    } else if let Some(path) = &args.file {
        debug!(path = %path.display(), "reading call file");
        ser::read_file(path)
    } else {
        debug!("reading call from stdin");
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        ser::from_json(&source)
    }
}

/// Check one call and print the outcome; `Ok(false)` on a contract violation
fn run_call(call: &CallSpec, config: &RenderConfig) -> Result<bool, SerError> {
    let registry = Registry::global();
    let signature = call.signature(registry)?;
    debug!(params = signature.params().len(), has_return = signature.ret().is_some(), "signature built");

    let verdict = check_call(&signature, registry, call.arguments(), call.return_value());
    match verdict {
        CallVerdict::Pass(bindings) => {
            if bindings.is_empty() {
                println!("{}", "ok".green().bold());
            } else {
                println!("{} {}", "ok".green().bold(), bindings);
            }
            Ok(true)
        }
        CallVerdict::Fail(failure) => {
            eprintln!("{}", "Contract violation".red().bold());
            println!("{}", failure.report(config));
            Ok(false)
        }
    }
}
