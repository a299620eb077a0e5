//! Flat program: the output of closure conversion.
//!
//! No lambdas remain. Every function is a top-level `FlatFunction` whose
//! parameters are its captured free variables followed by its own
//! parameters. Bodies are straight-line instruction lists; conditionals are
//! the only nesting.

use crate::ir::intrinsic::Intrinsic;
use crate::ir::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

/// A storage location in emitted code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Var {
    /// Numbered temporary, unique within a compilation.
    Temp(u32),
    /// A function parameter, identified by its placeholder node.
    Param { node: NodeId, name: String },
    /// Result of the function being emitted.
    Result,
    /// Result of the entry expression.
    MainResult,
}

impl std::fmt::Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Var::Temp(n) => write!(f, "_t{}", n),
            Var::Param { node, name } => write!(f, "p{}_{}", node.0, sanitize(name)),
            Var::Result => write!(f, "_result"),
            Var::MainResult => write!(f, "_main_result"),
        }
    }
}

/// What a closure calls once saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callee {
    Function(FunctionId),
    Intrinsic(Intrinsic),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    AllocInt {
        dst: Var,
        value: i64,
    },
    AllocStr {
        dst: Var,
        value: String,
    },
    /// Nullary constructor value. Tag 0 is unit.
    AllocCon {
        dst: Var,
        tag: u32,
        name: String,
    },
    Copy {
        dst: Var,
        src: Var,
    },
    /// Reads the closure of a top-level function from the program globals.
    LoadGlobal {
        dst: Var,
        slot: usize,
    },
    /// Fresh closure with no arguments applied.
    AllocClosure {
        dst: Var,
        callee: Callee,
        arity: usize,
    },
    /// Saturated intrinsic call, bypassing closure allocation.
    CallIntrinsic {
        dst: Var,
        intrinsic: Intrinsic,
        args: Vec<Var>,
    },
    /// Generic one-argument application through the runtime.
    Apply {
        dst: Var,
        func: Var,
        arg: Var,
    },
    /// Evaluates the condition, then exactly one branch.
    Branch {
        dst: Var,
        cond: Var,
        then_block: Block,
        else_block: Block,
    },
}

impl Instr {
    pub fn dst(&self) -> &Var {
        match self {
            Instr::AllocInt { dst, .. }
            | Instr::AllocStr { dst, .. }
            | Instr::AllocCon { dst, .. }
            | Instr::Copy { dst, .. }
            | Instr::LoadGlobal { dst, .. }
            | Instr::AllocClosure { dst, .. }
            | Instr::CallIntrinsic { dst, .. }
            | Instr::Apply { dst, .. }
            | Instr::Branch { dst, .. } => dst,
        }
    }
}

/// Straight-line code whose value ends up in `result`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub instrs: Vec<Instr>,
    pub result: Var,
}

impl Block {
    /// Visits every instruction, including those nested in branches.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Instr)) {
        for instr in &self.instrs {
            f(instr);
            if let Instr::Branch {
                then_block,
                else_block,
                ..
            } = instr
            {
                then_block.walk(f);
                else_block.walk(f);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    /// A top-level function definition.
    Named(String),
    /// A lambda lifted out of an expression; `binding` is the local name it
    /// was bound to, if any.
    Anonymous { id: u32, binding: Option<String> },
}

#[derive(Debug, Clone)]
pub struct FlatFunction {
    pub id: FunctionId,
    pub kind: FunctionKind,
    /// C symbol of the implementation.
    pub symbol: String,
    /// Captured free variables, passed first.
    pub captures: Vec<Var>,
    pub params: Vec<Var>,
    pub body: Block,
}

impl FlatFunction {
    pub fn arity(&self) -> usize {
        self.captures.len() + self.params.len()
    }

    /// All parameters in calling order.
    pub fn all_params(&self) -> impl Iterator<Item = &Var> {
        self.captures.iter().chain(self.params.iter())
    }

    pub fn display_name(&self) -> String {
        match &self.kind {
            FunctionKind::Named(name) => name.clone(),
            FunctionKind::Anonymous { id, binding: Some(b) } => format!("{} (lambda {})", b, id),
            FunctionKind::Anonymous { id, binding: None } => format!("lambda {}", id),
        }
    }
}

/// One program-global closure per top-level function, built at startup.
#[derive(Debug, Clone)]
pub struct GlobalSlot {
    pub name: String,
    /// C field name in the program globals record.
    pub field: String,
    pub function: FunctionId,
    pub arity: usize,
}

#[derive(Debug, Clone)]
pub struct FlatProgram {
    pub module: String,
    /// Named functions first (source order), then anonymous ones (discovery
    /// order). `functions[i].id == FunctionId(i)`.
    pub functions: Vec<FlatFunction>,
    pub globals: Vec<GlobalSlot>,
    pub entry_name: String,
    pub entry: Block,
}

impl FlatProgram {
    pub fn function(&self, id: FunctionId) -> &FlatFunction {
        &self.functions[id.0 as usize]
    }

    pub fn function_named(&self, name: &str) -> Option<&FlatFunction> {
        self.functions
            .iter()
            .find(|f| matches!(&f.kind, FunctionKind::Named(n) if n == name))
    }

    /// Visits every instruction of every function body and the entry.
    pub fn walk_instrs<'a>(&'a self, f: &mut dyn FnMut(&'a Instr)) {
        for func in &self.functions {
            func.body.walk(f);
        }
        self.entry.walk(f);
    }
}

/// Maps a source name to a C identifier fragment. `_` is doubled so that the
/// `_xx` hex escapes for other characters cannot collide.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if c == '_' {
            out.push_str("__");
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("_{:02x}", b));
            }
        }
    }
    out
}
