//! Closure conversion: core IR graph → `FlatProgram`.
//!
//! 1. Every top-level binding whose node is a lambda becomes a named
//!    function with a program-global closure.
//! 2. A pre-pass collects every other lambda reachable from a top-level
//!    definition (following indirections into non-top-level values) and
//!    gives it a synthetic id in discovery order.
//! 3. Free parameters of collected lambdas are computed to a fixpoint, so a
//!    lambda that refers to another one also captures what that one needs.
//!    Free parameters become leading parameters; a reference to the lambda
//!    allocates its closure and applies it to them.
//! 4. Bodies are flattened into instructions. Values (non-lambda bindings)
//!    are inlined at each use; applications whose head is an intrinsic with
//!    exactly its arity in arguments become direct calls.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::codegen::flat::{
    sanitize, Block, Callee, FlatFunction, FlatProgram, FunctionId, FunctionKind, GlobalSlot,
    Instr, Var,
};
use crate::codegen::MAX_ARITY;
use crate::error::CodegenError;
use crate::ir::intrinsic::Intrinsic;
use crate::ir::module::CoreModule;
use crate::ir::node::{Literal, NodeId, NodeKind};

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Emit saturated intrinsic applications as direct runtime calls instead
    /// of closure allocation plus generic application.
    pub direct_intrinsic_calls: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            direct_intrinsic_calls: true,
        }
    }
}

pub fn closure_convert(
    module: &CoreModule,
    options: &CodegenOptions,
) -> Result<FlatProgram, CodegenError> {
    let entry = module
        .definition(&module.entry)
        .ok_or_else(|| CodegenError::MissingEntry {
            name: module.entry.clone(),
        })?;

    let mut conv = Converter::new(module, options);
    conv.register_globals();
    conv.collect_lambdas();
    conv.compute_free_vars();
    conv.assign_function_ids();

    let mut functions = Vec::new();
    let named: Vec<(NodeId, FunctionId, String)> = conv
        .global_order
        .iter()
        .map(|&(node, ref name)| (node, conv.function_ids[&node], name.clone()))
        .collect();
    for (node, id, name) in named {
        let symbol = format!("lz_fn_{}", sanitize(&name));
        functions.push(conv.emit_function(node, id, FunctionKind::Named(name), symbol)?);
    }
    let anonymous: Vec<(NodeId, u32)> = conv.anon.iter().map(|(n, i)| (*n, *i)).collect();
    for (node, anon_id) in anonymous {
        let id = conv.function_ids[&node];
        let kind = FunctionKind::Anonymous {
            id: anon_id,
            binding: module.arena.name(node).map(str::to_owned),
        };
        let symbol = format!("lz_anon_{}", anon_id);
        functions.push(conv.emit_function(node, id, kind, symbol)?);
    }

    let mut ctx = FnCtx::default();
    let mut instrs = Vec::new();
    conv.emit_reference(entry, Var::MainResult, &mut instrs, &mut ctx)?;

    for func in &functions {
        if func.arity() > MAX_ARITY {
            warn!(
                "function '{}' has arity {}; the runtime supports at most {}",
                func.display_name(),
                func.arity(),
                MAX_ARITY
            );
        }
    }

    let globals = conv
        .global_order
        .iter()
        .map(|(node, name)| GlobalSlot {
            name: name.clone(),
            field: format!("g_{}", sanitize(name)),
            function: conv.function_ids[node],
            arity: module.lambda_params(*node).len(),
        })
        .collect();

    debug!(
        "closure conversion: {} named functions, {} lifted lambdas, {} temporaries",
        conv.global_order.len(),
        conv.anon.len(),
        conv.next_temp
    );

    Ok(FlatProgram {
        module: module.name.clone(),
        functions,
        globals,
        entry_name: module.entry.clone(),
        entry: Block {
            instrs,
            result: Var::MainResult,
        },
    })
}

/// Per-function emission state.
#[derive(Default)]
struct FnCtx {
    /// Placeholders bound as parameters of the function being emitted.
    in_scope: HashSet<NodeId>,
    /// Values currently being inlined, innermost last.
    inlining: Vec<NodeId>,
}

struct Converter<'m> {
    module: &'m CoreModule,
    options: &'m CodegenOptions,
    next_temp: u32,
    definitions: HashSet<NodeId>,
    /// Top-level lambdas with their binding names, in source order.
    global_order: Vec<(NodeId, String)>,
    global_slots: HashMap<NodeId, usize>,
    /// Collected non-top-level lambdas and their synthetic ids.
    anon: IndexMap<NodeId, u32>,
    /// Ordered free placeholders of each collected lambda.
    free: HashMap<NodeId, Vec<NodeId>>,
    function_ids: HashMap<NodeId, FunctionId>,
    constructors: IndexMap<String, u32>,
}

impl<'m> Converter<'m> {
    fn new(module: &'m CoreModule, options: &'m CodegenOptions) -> Self {
        Self {
            module,
            options,
            next_temp: 0,
            definitions: module.definitions().iter().map(|(_, id)| *id).collect(),
            global_order: Vec::new(),
            global_slots: HashMap::new(),
            anon: IndexMap::new(),
            free: HashMap::new(),
            function_ids: HashMap::new(),
            constructors: IndexMap::new(),
        }
    }

    fn fresh(&mut self) -> Var {
        let v = Var::Temp(self.next_temp);
        self.next_temp += 1;
        v
    }

    fn param_var(&self, node: NodeId) -> Var {
        Var::Param {
            node,
            name: self.module.arena.label(node),
        }
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    fn register_globals(&mut self) {
        let module = self.module;
        for (name, id) in module.definitions() {
            if let NodeKind::Lambda { .. } = module.kind(id) {
                self.global_slots.insert(id, self.global_order.len());
                self.global_order.push((id, name.to_owned()));
            }
        }
    }

    fn collect_lambdas(&mut self) {
        let module = self.module;
        for (_, root) in module.definitions() {
            let mut visited = HashSet::new();
            match module.kind(root) {
                NodeKind::Lambda { body, .. } => self.collect(*body, &mut visited),
                _ => self.collect(root, &mut visited),
            }
        }
    }

    fn collect(&mut self, id: NodeId, visited: &mut HashSet<NodeId>) {
        let module = self.module;
        match module.kind(id) {
            NodeKind::Lambda { body, .. } => {
                if self.global_slots.contains_key(&id) || self.anon.contains_key(&id) {
                    return;
                }
                let next = self.anon.len() as u32;
                self.anon.insert(id, next);
                trace!("collected lambda {} as anonymous {}", id, next);
                self.collect(*body, visited);
            }
            NodeKind::Application { func, arg } => {
                self.collect(*func, visited);
                self.collect(*arg, visited);
            }
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                self.collect(*cond, visited);
                self.collect(*then_branch, visited);
                self.collect(*else_branch, visited);
            }
            NodeKind::Indirection(target) => {
                let target = *target;
                if self.definitions.contains(&target) {
                    return;
                }
                match module.kind(target) {
                    NodeKind::Placeholder
                    | NodeKind::Intrinsic(_)
                    | NodeKind::Constructor(_)
                    | NodeKind::Literal(_)
                    | NodeKind::NoForm => {}
                    _ => {
                        if visited.insert(target) {
                            self.collect(target, visited);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn compute_free_vars(&mut self) {
        let lambdas: Vec<NodeId> = self.anon.keys().copied().collect();
        for &lam in &lambdas {
            self.free.insert(lam, Vec::new());
        }
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = false;
            for &lam in &lambdas {
                let found: Vec<NodeId> = self.free_in(lam).into_iter().collect();
                if self.free.get(&lam) != Some(&found) {
                    self.free.insert(lam, found);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        trace!("free variables settled after {} rounds", rounds);
    }

    fn free_in(&self, lam: NodeId) -> BTreeSet<NodeId> {
        let module = self.module;
        let NodeKind::Lambda { body, .. } = module.kind(lam) else {
            return BTreeSet::new();
        };
        let own: HashSet<NodeId> = module.lambda_params(lam).into_iter().collect();
        let mut acc = BTreeSet::new();
        let mut visited = HashSet::new();
        self.scan(*body, &mut acc, &mut visited);
        acc.retain(|p| !own.contains(p));
        acc
    }

    fn scan(&self, id: NodeId, acc: &mut BTreeSet<NodeId>, visited: &mut HashSet<NodeId>) {
        match self.module.kind(id) {
            NodeKind::Placeholder => {
                acc.insert(id);
            }
            NodeKind::Indirection(target) => self.scan_target(*target, acc, visited),
            NodeKind::Lambda { .. } => {
                if let Some(free) = self.free.get(&id) {
                    acc.extend(free.iter().copied());
                }
            }
            NodeKind::Application { func, arg } => {
                self.scan(*func, acc, visited);
                self.scan(*arg, acc, visited);
            }
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                self.scan(*cond, acc, visited);
                self.scan(*then_branch, acc, visited);
                self.scan(*else_branch, acc, visited);
            }
            _ => {}
        }
    }

    fn scan_target(&self, target: NodeId, acc: &mut BTreeSet<NodeId>, visited: &mut HashSet<NodeId>) {
        if self.definitions.contains(&target) {
            return;
        }
        match self.module.kind(target) {
            NodeKind::Placeholder => {
                acc.insert(target);
            }
            NodeKind::Lambda { .. } => {
                if let Some(free) = self.free.get(&target) {
                    acc.extend(free.iter().copied());
                }
            }
            NodeKind::Intrinsic(_)
            | NodeKind::Constructor(_)
            | NodeKind::Literal(_)
            | NodeKind::NoForm => {}
            _ => {
                if visited.insert(target) {
                    self.scan(target, acc, visited);
                }
            }
        }
    }

    fn assign_function_ids(&mut self) {
        let mut next = 0u32;
        for (node, _) in &self.global_order {
            self.function_ids.insert(*node, FunctionId(next));
            next += 1;
        }
        for node in self.anon.keys() {
            self.function_ids.insert(*node, FunctionId(next));
            next += 1;
        }
    }

    /// Head intrinsic and arguments of an application chain, when the head is
    /// an intrinsic (directly or through one indirection) applied to exactly
    /// its arity in arguments.
    fn saturated_intrinsic(&self, id: NodeId) -> Option<(Intrinsic, Vec<NodeId>)> {
        let module = self.module;
        let mut args = Vec::new();
        let mut current = id;
        while let NodeKind::Application { func, arg } = module.kind(current) {
            args.push(*arg);
            current = *func;
        }
        let intrinsic = match module.kind(current) {
            NodeKind::Intrinsic(i) => *i,
            NodeKind::Indirection(target) => match module.kind(*target) {
                NodeKind::Intrinsic(i) => *i,
                _ => return None,
            },
            _ => return None,
        };
        if args.len() != intrinsic.arity() {
            return None;
        }
        args.reverse();
        Some((intrinsic, args))
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    fn emit_function(
        &mut self,
        lam: NodeId,
        id: FunctionId,
        kind: FunctionKind,
        symbol: String,
    ) -> Result<FlatFunction, CodegenError> {
        let module = self.module;
        let NodeKind::Lambda { body, .. } = module.kind(lam) else {
            return Err(CodegenError::UncollectedLambda { node: lam.0 });
        };
        let free = self.free.get(&lam).cloned().unwrap_or_default();
        let own = module.lambda_params(lam);
        let mut ctx = FnCtx::default();
        ctx.in_scope.extend(free.iter().copied());
        ctx.in_scope.extend(own.iter().copied());

        let captures: Vec<Var> = free.iter().map(|p| self.param_var(*p)).collect();
        let params: Vec<Var> = own.iter().map(|p| self.param_var(*p)).collect();
        let mut instrs = Vec::new();
        self.emit_expr(*body, Var::Result, &mut instrs, &mut ctx)?;
        Ok(FlatFunction {
            id,
            kind,
            symbol,
            captures,
            params,
            body: Block {
                instrs,
                result: Var::Result,
            },
        })
    }

    /// Evaluates `id` into a variable, reusing parameter variables instead of
    /// copying them.
    fn operand(
        &mut self,
        id: NodeId,
        out: &mut Vec<Instr>,
        ctx: &mut FnCtx,
    ) -> Result<Var, CodegenError> {
        let module = self.module;
        let placeholder = match module.kind(id) {
            NodeKind::Placeholder => Some(id),
            NodeKind::Indirection(t) if matches!(module.kind(*t), NodeKind::Placeholder) => {
                Some(*t)
            }
            _ => None,
        };
        if let Some(p) = placeholder {
            self.check_in_scope(p, ctx)?;
            return Ok(self.param_var(p));
        }
        let tmp = self.fresh();
        self.emit_expr(id, tmp.clone(), out, ctx)?;
        Ok(tmp)
    }

    fn check_in_scope(&self, placeholder: NodeId, ctx: &FnCtx) -> Result<(), CodegenError> {
        if ctx.in_scope.contains(&placeholder) {
            Ok(())
        } else {
            Err(CodegenError::UnboundPlaceholder {
                name: self.module.arena.label(placeholder),
            })
        }
    }

    fn emit_block(&mut self, id: NodeId, ctx: &mut FnCtx) -> Result<Block, CodegenError> {
        let result = self.fresh();
        let mut instrs = Vec::new();
        self.emit_expr(id, result.clone(), &mut instrs, ctx)?;
        Ok(Block { instrs, result })
    }

    fn emit_expr(
        &mut self,
        id: NodeId,
        dst: Var,
        out: &mut Vec<Instr>,
        ctx: &mut FnCtx,
    ) -> Result<(), CodegenError> {
        let module = self.module;
        match module.kind(id) {
            NodeKind::NoForm => {
                return Err(CodegenError::UnfilledNode {
                    name: module.arena.label(id),
                })
            }
            NodeKind::Literal(Literal::Int(n)) => out.push(Instr::AllocInt { dst, value: *n }),
            NodeKind::Literal(Literal::Str(s)) => out.push(Instr::AllocStr {
                dst,
                value: s.clone(),
            }),
            NodeKind::Constructor(name) => self.emit_constructor(name, dst, out),
            NodeKind::Placeholder => {
                self.check_in_scope(id, ctx)?;
                out.push(Instr::Copy {
                    dst,
                    src: self.param_var(id),
                });
            }
            NodeKind::Intrinsic(i) => out.push(Instr::AllocClosure {
                dst,
                callee: Callee::Intrinsic(*i),
                arity: i.arity(),
            }),
            NodeKind::Lambda { .. } => self.emit_lambda_ref(id, dst, out, ctx)?,
            NodeKind::Indirection(target) => self.emit_reference(*target, dst, out, ctx)?,
            NodeKind::Application { func, arg } => {
                if self.options.direct_intrinsic_calls {
                    if let Some((intrinsic, args)) = self.saturated_intrinsic(id) {
                        let mut vars = Vec::with_capacity(args.len());
                        for a in args {
                            vars.push(self.operand(a, out, ctx)?);
                        }
                        out.push(Instr::CallIntrinsic {
                            dst,
                            intrinsic,
                            args: vars,
                        });
                        return Ok(());
                    }
                }
                let func = self.operand(*func, out, ctx)?;
                let arg = self.operand(*arg, out, ctx)?;
                out.push(Instr::Apply { dst, func, arg });
            }
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.operand(*cond, out, ctx)?;
                let then_block = self.emit_block(*then_branch, ctx)?;
                let else_block = self.emit_block(*else_branch, ctx)?;
                out.push(Instr::Branch {
                    dst,
                    cond,
                    then_block,
                    else_block,
                });
            }
        }
        Ok(())
    }

    /// Emits a use of a named node: a parameter, a global function, a
    /// lifted lambda, an intrinsic, or an inlined value.
    fn emit_reference(
        &mut self,
        target: NodeId,
        dst: Var,
        out: &mut Vec<Instr>,
        ctx: &mut FnCtx,
    ) -> Result<(), CodegenError> {
        let module = self.module;
        match module.kind(target) {
            NodeKind::Placeholder => {
                self.check_in_scope(target, ctx)?;
                out.push(Instr::Copy {
                    dst,
                    src: self.param_var(target),
                });
            }
            NodeKind::Lambda { .. } => match self.global_slots.get(&target) {
                Some(&slot) => out.push(Instr::LoadGlobal { dst, slot }),
                None => self.emit_lambda_ref(target, dst, out, ctx)?,
            },
            NodeKind::Intrinsic(i) => out.push(Instr::AllocClosure {
                dst,
                callee: Callee::Intrinsic(*i),
                arity: i.arity(),
            }),
            NodeKind::NoForm => {
                return Err(CodegenError::UnfilledNode {
                    name: module.arena.label(target),
                })
            }
            _ => {
                if ctx.inlining.contains(&target) {
                    return Err(CodegenError::CyclicValue {
                        name: module.arena.label(target),
                    });
                }
                ctx.inlining.push(target);
                let result = self.emit_expr(target, dst, out, ctx);
                ctx.inlining.pop();
                result?;
            }
        }
        Ok(())
    }

    fn emit_lambda_ref(
        &mut self,
        lam: NodeId,
        dst: Var,
        out: &mut Vec<Instr>,
        ctx: &mut FnCtx,
    ) -> Result<(), CodegenError> {
        let function = *self
            .function_ids
            .get(&lam)
            .ok_or(CodegenError::UncollectedLambda { node: lam.0 })?;
        let free = self.free.get(&lam).cloned().unwrap_or_default();
        let arity = free.len() + self.module.lambda_params(lam).len();
        let callee = Callee::Function(function);
        if free.is_empty() {
            out.push(Instr::AllocClosure { dst, callee, arity });
            return Ok(());
        }
        let mut current = self.fresh();
        out.push(Instr::AllocClosure {
            dst: current.clone(),
            callee,
            arity,
        });
        for (i, p) in free.iter().enumerate() {
            self.check_in_scope(*p, ctx)?;
            let next = if i + 1 == free.len() {
                dst.clone()
            } else {
                self.fresh()
            };
            out.push(Instr::Apply {
                dst: next.clone(),
                func: current,
                arg: self.param_var(*p),
            });
            current = next;
        }
        Ok(())
    }

    fn emit_constructor(&mut self, name: &str, dst: Var, out: &mut Vec<Instr>) {
        let instr = match name {
            "True" => Instr::AllocInt { dst, value: 1 },
            "False" => Instr::AllocInt { dst, value: 0 },
            "()" => Instr::AllocCon {
                dst,
                tag: 0,
                name: "()".to_owned(),
            },
            _ => {
                let next = self.constructors.len() as u32 + 1;
                let tag = *self.constructors.entry(name.to_owned()).or_insert(next);
                Instr::AllocCon {
                    dst,
                    tag,
                    name: name.to_owned(),
                }
            }
        };
        out.push(instr);
    }
}
