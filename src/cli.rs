//! CLI argument parsing, exported from the library so integration tests can exercise it.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::interp::EvalLimits;
use crate::lower::OperatorFallback;
use crate::{CompileOptions, EmitKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitArg {
    /// Pretty-printed core IR
    Core,
    /// Core IR as JSON
    CoreJson,
    /// Generated C source
    C,
    /// Execute the program in-process
    Run,
}

impl From<EmitArg> for EmitKind {
    fn from(arg: EmitArg) -> Self {
        match arg {
            EmitArg::Core => EmitKind::Core,
            EmitArg::CoreJson => EmitKind::CoreJson,
            EmitArg::C => EmitKind::C,
            EmitArg::Run => EmitKind::Run,
        }
    }
}

/// Fully-parsed CLI arguments for a compilation request.
#[derive(Debug, Parser)]
#[command(name = "lazyc", version, about = "Compiles a small lazy functional language to C", long_about = None)]
pub struct Cli {
    /// Source file to compile
    pub input: PathBuf,

    /// What to produce
    #[arg(long, value_enum, default_value_t = EmitArg::C)]
    pub emit: EmitArg,

    /// Write output to this file instead of stdout (the executable with --build)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Build a native executable with the C compiler
    #[arg(long)]
    pub build: bool,

    /// C compiler for --build (default: $LAZYC_CC, else cc)
    #[arg(long)]
    pub cc: Option<String>,

    /// Maximum call depth for --emit run
    #[arg(long, default_value_t = EvalLimits::default().max_depth)]
    pub max_depth: usize,

    /// Report unbound operators instead of falling back to built-ins
    #[arg(long)]
    pub strict_operators: bool,

    /// Name of the entry binding
    #[arg(long, default_value = "main")]
    pub entry: String,

    /// Log pipeline progress (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn compile_options(&self) -> CompileOptions {
        let mut options = CompileOptions {
            emit: self.emit.into(),
            ..CompileOptions::default()
        };
        options.limits.max_depth = self.max_depth;
        options.lower.entry = self.entry.clone();
        if self.strict_operators {
            options.lower.operator_fallback = OperatorFallback::Strict;
        }
        options
    }
}
