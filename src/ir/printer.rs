//! Core IR pretty-printer.
//!
//! Prints every top-level definition of a `CoreModule` in source order as a
//! nested block tree. An indirection to a top-level definition prints as
//! `&name`, one to an intrinsic as `&+ => #plus` and one to a parameter as
//! `$x`. Indirections to `let`/`where` bindings are followed and print the
//! bound body after `&name => `; a back edge on the current path prints as
//! `<cycle nN>`. Output is deterministic, so printing the same module twice
//! yields identical text.

use std::collections::HashSet;
use std::fmt::Write;

use crate::error::CodegenError;
use crate::ir::module::CoreModule;
use crate::ir::node::{Literal, NodeId, NodeKind};

/// Emits a text dump of all top-level definitions.
pub fn print_core(module: &CoreModule) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "-- core module: {}", module.name)?;
    for (name, id) in module.definitions() {
        write!(out, "{} = ", name)?;
        print_into(module, &mut out, id)?;
        writeln!(out)?;
    }
    Ok(out)
}

/// Prints a single node tree. Lowering traces each definition with it.
pub fn print_node(module: &CoreModule, id: NodeId) -> Result<String, CodegenError> {
    let mut out = String::new();
    print_into(module, &mut out, id)?;
    Ok(out)
}

fn print_into(module: &CoreModule, out: &mut String, id: NodeId) -> Result<(), CodegenError> {
    NodePrinter {
        module,
        out,
        on_path: HashSet::new(),
    }
    .node(id, 0)
}

fn escape_str(s: &str) -> String {
    s.escape_default().to_string()
}

struct NodePrinter<'a> {
    module: &'a CoreModule,
    out: &'a mut String,
    on_path: HashSet<NodeId>,
}

impl<'a> NodePrinter<'a> {
    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn field(&mut self, label: &str, id: NodeId, depth: usize) -> Result<(), CodegenError> {
        self.indent(depth);
        write!(self.out, "{} = ", label)?;
        self.node(id, depth)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn reference(&mut self, target: NodeId, depth: usize) -> Result<(), CodegenError> {
        let module = self.module;
        let label = module.arena.label(target);
        match module.arena.kind(target) {
            NodeKind::Placeholder => write!(self.out, "${}", label)?,
            NodeKind::Intrinsic(i) => write!(self.out, "&{} => #{}", label, i)?,
            _ if module.is_definition(target) => write!(self.out, "&{}", label)?,
            _ => {
                write!(self.out, "&{} => ", label)?;
                self.node(target, depth)?;
            }
        }
        Ok(())
    }

    fn node(&mut self, id: NodeId, depth: usize) -> Result<(), CodegenError> {
        if !self.on_path.insert(id) {
            write!(self.out, "<cycle {}>", id)?;
            return Ok(());
        }
        let kind = self.module.arena.kind(id).clone();
        match kind {
            NodeKind::NoForm => write!(self.out, "NO_FORM")?,
            NodeKind::Placeholder => {
                write!(self.out, "PLACEHOLDER {}", self.module.arena.label(id))?
            }
            NodeKind::Constructor(name) => write!(self.out, "CON {}", name)?,
            NodeKind::Indirection(target) => self.reference(target, depth)?,
            NodeKind::Intrinsic(i) => write!(self.out, "#{}", i)?,
            NodeKind::Literal(Literal::Int(n)) => write!(self.out, "{}", n)?,
            NodeKind::Literal(Literal::Str(s)) => write!(self.out, "\"{}\"", escape_str(&s))?,
            NodeKind::Application { func, arg } => {
                writeln!(self.out, "APPLY {{")?;
                self.field("fn", func, depth + 1)?;
                self.field("arg", arg, depth + 1)?;
                self.indent(depth);
                write!(self.out, "}}")?;
            }
            NodeKind::Lambda { body, .. } => {
                let params: Vec<String> = self
                    .module
                    .lambda_params(id)
                    .into_iter()
                    .map(|p| self.module.arena.label(p))
                    .collect();
                writeln!(self.out, "LAMBDA ({}) {{", params.join(", "))?;
                self.field("body", body, depth + 1)?;
                self.indent(depth);
                write!(self.out, "}}")?;
            }
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                writeln!(self.out, "IF {{")?;
                self.field("cond", cond, depth + 1)?;
                self.field("then", then_branch, depth + 1)?;
                self.field("else", else_branch, depth + 1)?;
                self.indent(depth);
                write!(self.out, "}}")?;
            }
        }
        self.on_path.remove(&id);
        Ok(())
    }
}
