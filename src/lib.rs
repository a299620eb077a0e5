//! lazyc: ahead-of-time compiler for a small lazy functional language.
//!
//! Compiler pipeline:
//!
//! ```text
//! source (.hs) → Lexer → [Tokens] → Layout → Parser → [AST]
//!   → Lowerer → [CoreModule] → closure conversion → [FlatProgram]
//!   → C emission | executor
//! ```
//!
//! The core IR is a graph: a name referenced twice points at one node, so
//! sharing survives lowering. Closure conversion turns every lambda into a
//! top-level function over its free and own parameters; the C runtime (and
//! the in-process executor that mirrors it) applies closures one argument
//! at a time.

pub mod cli;
pub mod codegen;
pub mod diagnostics;
pub mod error;
pub mod interp;
pub mod ir;
pub mod lower;
pub mod parser;

use std::path::Path;

use log::debug;

pub use error::Error;

use crate::codegen::{closure_convert, emit_c, CodegenOptions, FlatProgram};
use crate::interp::{run_program, EvalLimits};
use crate::ir::CoreModule;
use crate::lower::{lower_module, LowerOptions};

/// Controls what `compile()` emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitKind {
    /// Pretty-printed core IR.
    Core,
    /// Core IR snapshot as JSON.
    CoreJson,
    /// Generated C source (needs the embedded runtime to build).
    #[default]
    C,
    /// Execute the program and return what it prints.
    Run,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub emit: EmitKind,
    pub lower: LowerOptions,
    pub codegen: CodegenOptions,
    pub limits: EvalLimits,
}

/// Parses and lowers `source` into the core IR.
pub fn lower_source(source: &str, options: &LowerOptions) -> Result<CoreModule, Error> {
    let ast = parser::parse_source(source)?;
    debug!("parsed {} declarations", ast.decls.len());
    Ok(lower_module(&ast, options)?)
}

/// Runs the pipeline up to closure conversion.
pub fn flatten_source(source: &str, options: &CompileOptions) -> Result<FlatProgram, Error> {
    let module = lower_source(source, &options.lower)?;
    Ok(closure_convert(&module, &options.codegen)?)
}

/// Compiles a source string through the full pipeline.
///
/// Returns the emitted output as a `String`, or an `Error` if any stage
/// fails. The pipeline aborts at the first error.
pub fn compile(source: &str, options: &CompileOptions) -> Result<String, Error> {
    let module = lower_source(source, &options.lower)?;
    match options.emit {
        EmitKind::Core => Ok(ir::printer::print_core(&module)?),
        EmitKind::CoreJson => Ok(ir::serial::core_to_json_string(&module)),
        EmitKind::C => {
            let program = closure_convert(&module, &options.codegen)?;
            Ok(emit_c(&program)?)
        }
        EmitKind::Run => {
            let program = closure_convert(&module, &options.codegen)?;
            let execution = run_program(&program, options.limits)?;
            Ok(execution.transcript())
        }
    }
}

/// Reads `path` and compiles it.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<String, Error> {
    let source = std::fs::read_to_string(path)?;
    compile(&source, options)
}
