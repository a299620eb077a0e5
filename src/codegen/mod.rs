pub mod build;
pub mod c_emit;
pub mod closure;
pub mod flat;

pub use build::{build_binary, resolve_compiler, runtime_c_source, runtime_h_source};
pub use c_emit::emit_c;
pub use closure::{closure_convert, CodegenOptions};
pub use flat::{Block, Callee, FlatFunction, FlatProgram, FunctionId, GlobalSlot, Instr, Var};

/// Largest closure arity the runtimes can call.
pub const MAX_ARITY: usize = 8;
