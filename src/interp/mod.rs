//! Flat-program executor.
//!
//! Runs a closure-converted program directly, following the same value
//! contract as the embedded C runtime: the global closure table is built
//! once, the entry block is evaluated, and every non-intrinsic call goes
//! through `value::apply`.

pub mod intrinsics;
pub mod value;

use std::collections::HashMap;

use log::debug;

use crate::codegen::flat::{Block, Callee, FlatProgram, FunctionId, Instr, Var};
use crate::error::RuntimeError;

pub use value::{apply, Closure, Invoke, Value};

#[derive(Debug, Clone, Copy)]
pub struct EvalLimits {
    /// Deepest allowed nesting of function calls.
    pub max_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self { max_depth: 1_000 }
    }
}

/// Result of running a program.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Text written by `putStrLn`.
    pub output: String,
    /// Value of the entry binding.
    pub result: Value,
}

impl Execution {
    /// What the native binary prints: program output, then the result on
    /// its own line unless it is unit.
    pub fn transcript(&self) -> String {
        let mut text = self.output.clone();
        if !self.result.is_unit() {
            text.push_str(&self.result.to_string());
            text.push('\n');
        }
        text
    }
}

pub fn run_program(program: &FlatProgram, limits: EvalLimits) -> Result<Execution, RuntimeError> {
    let mut machine = Machine::new(program, limits);
    let mut frame = Frame::new();
    machine.exec_block(&program.entry, &mut frame)?;
    let result = frame.get(&program.entry.result)?;
    debug!(
        "program finished: {} calls, deepest nesting {}",
        machine.calls, machine.deepest
    );
    Ok(Execution {
        output: machine.output,
        result,
    })
}

// ---------------------------------------------------------------------------
// Machine state
// ---------------------------------------------------------------------------

struct Frame {
    vars: HashMap<Var, Value>,
}

impl Frame {
    fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    fn get(&self, var: &Var) -> Result<Value, RuntimeError> {
        self.vars
            .get(var)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: var.to_string(),
            })
    }

    fn set(&mut self, var: &Var, value: Value) {
        self.vars.insert(var.clone(), value);
    }
}

struct Machine<'p> {
    program: &'p FlatProgram,
    limits: EvalLimits,
    globals: Vec<Value>,
    output: String,
    depth: usize,
    deepest: usize,
    calls: u64,
}

impl<'p> Machine<'p> {
    fn new(program: &'p FlatProgram, limits: EvalLimits) -> Self {
        let globals = program
            .globals
            .iter()
            .map(|slot| Value::closure(Callee::Function(slot.function), slot.arity))
            .collect();
        Self {
            program,
            limits,
            globals,
            output: String::new(),
            depth: 0,
            deepest: 0,
            calls: 0,
        }
    }

    fn call_function(&mut self, id: FunctionId, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let program = self.program;
        let func = program.function(id);
        if args.len() != func.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: func.arity(),
                found: args.len(),
            });
        }
        if self.depth >= self.limits.max_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;
        self.deepest = self.deepest.max(self.depth);
        self.calls += 1;

        let mut frame = Frame::new();
        for (param, arg) in func.all_params().zip(args) {
            frame.set(param, arg);
        }
        let result = self
            .exec_block(&func.body, &mut frame)
            .and_then(|()| frame.get(&func.body.result));
        self.depth -= 1;
        result
    }

    fn exec_block(&mut self, block: &'p Block, frame: &mut Frame) -> Result<(), RuntimeError> {
        for instr in &block.instrs {
            self.exec(instr, frame)?;
        }
        Ok(())
    }

    fn exec(&mut self, instr: &'p Instr, frame: &mut Frame) -> Result<(), RuntimeError> {
        match instr {
            Instr::AllocInt { dst, value } => frame.set(dst, Value::Int(*value)),
            Instr::AllocStr { dst, value } => frame.set(dst, Value::str(value)),
            Instr::AllocCon { dst, tag, .. } => frame.set(
                dst,
                Value::Con {
                    tag: *tag,
                    fields: Vec::new().into(),
                },
            ),
            Instr::Copy { dst, src } => {
                let v = frame.get(src)?;
                frame.set(dst, v);
            }
            Instr::LoadGlobal { dst, slot } => frame.set(dst, self.globals[*slot].clone()),
            Instr::AllocClosure { dst, callee, arity } => {
                frame.set(dst, Value::closure(*callee, *arity))
            }
            Instr::CallIntrinsic {
                dst,
                intrinsic,
                args,
            } => {
                let args = args
                    .iter()
                    .map(|a| frame.get(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let v = intrinsics::call(*intrinsic, &args, &mut self.output)?;
                frame.set(dst, v);
            }
            Instr::Apply { dst, func, arg } => {
                let f = frame.get(func)?;
                let a = frame.get(arg)?;
                let v = apply(&f, a, self)?;
                frame.set(dst, v);
            }
            Instr::Branch {
                dst,
                cond,
                then_block,
                else_block,
            } => {
                let c = frame.get(cond)?;
                let taken = match c {
                    Value::Int(n) => {
                        if n != 0 {
                            then_block
                        } else {
                            else_block
                        }
                    }
                    other => {
                        return Err(RuntimeError::TypeMismatch {
                            intrinsic: "if",
                            expected: "int",
                            found: other.kind(),
                        })
                    }
                };
                self.exec_block(taken, frame)?;
                let v = frame.get(&taken.result)?;
                frame.set(dst, v);
            }
        }
        Ok(())
    }
}

impl Invoke for Machine<'_> {
    fn invoke(&mut self, callee: Callee, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Callee::Function(id) => self.call_function(id, args),
            Callee::Intrinsic(i) => intrinsics::call(i, &args, &mut self.output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::closure::{closure_convert, CodegenOptions};
    use crate::lower::{lower_module, LowerOptions};
    use crate::parser::parse_source;

    fn run_with(src: &str, limits: EvalLimits) -> Result<Execution, RuntimeError> {
        let ast = parse_source(src).expect("parse");
        let module = lower_module(&ast, &LowerOptions::default()).expect("lower");
        let program = closure_convert(&module, &CodegenOptions::default()).expect("codegen");
        run_program(&program, limits)
    }

    fn run(src: &str) -> Execution {
        run_with(src, EvalLimits::default()).expect("run")
    }

    #[test]
    fn evaluates_arithmetic() {
        assert_eq!(run("main = 1 + 2 * 3").result, Value::Int(7));
    }

    #[test]
    fn calls_named_functions() {
        let exec = run("double x = x * 2\nmain = show (double 3)");
        assert_eq!(exec.result, Value::str("6"));
        assert_eq!(exec.transcript(), "6\n");
    }

    #[test]
    fn put_str_ln_output_precedes_nothing() {
        let exec = run("main = putStrLn \"hi\"");
        assert!(exec.result.is_unit());
        assert_eq!(exec.transcript(), "hi\n");
    }

    #[test]
    fn recursion_with_conditionals() {
        let exec = run("fact n = if n <= 1 then 1 else n * fact (n - 1)\nmain = fact 10");
        assert_eq!(exec.result, Value::Int(3_628_800));
    }

    #[test]
    fn untaken_branch_is_not_evaluated() {
        assert_eq!(run("main = if True then 1 else 1 `div` 0").result, Value::Int(1));
    }

    #[test]
    fn runaway_recursion_hits_the_depth_limit() {
        let err = run_with("loop x = loop x\nmain = loop 1", EvalLimits { max_depth: 32 }).unwrap_err();
        assert_eq!(err, RuntimeError::StackOverflow { limit: 32 });
    }

    #[test]
    fn non_integer_condition_is_a_type_mismatch() {
        let err = run_with("main = if \"yes\" then 1 else 2", EvalLimits::default()).unwrap_err();
        assert_eq!(err.to_string(), "if expects int, found string");
    }
}
