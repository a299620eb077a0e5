//! AST → core IR lowering.
//!
//! Every block of declarations (the module, each `let`, each `where`) is
//! lowered in two phases over one scope:
//!
//! 1. each binding gets a reserved `NoForm` slot, bound to its name;
//! 2. each body is lowered and written into its slot in place.
//!
//! Because references are resolved to slots, forward references and mutual
//! recursion need no ordering, and every use of a name shares the node of
//! its definition.

use std::collections::HashSet;

use log::{debug, log_enabled, trace, warn, Level};

use crate::error::LowerError;
use crate::ir::intrinsic::{is_operator_name, Intrinsic, PRELUDE_OPERATORS};
use crate::ir::module::CoreModule;
use crate::ir::node::{CoreArena, Literal, NodeId, NodeKind};
use crate::ir::printer::print_node;
use crate::ir::scope::{Env, ScopeId, ScopeKind};
use crate::parser::ast::{AstDecl, AstExpr, AstLit, AstModule, Ident};

/// What to do with an operator that is not bound in any enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorFallback {
    /// Synthesize the intrinsic of the same name when the catalog knows it.
    #[default]
    Catalog,
    /// Report it like any other unresolved identifier.
    Strict,
}

#[derive(Debug, Clone)]
pub struct LowerOptions {
    pub operator_fallback: OperatorFallback,
    /// Bind the operator symbols of [`PRELUDE_OPERATORS`] in the prelude
    /// scope. Named intrinsics (`show`, `div`, ...) are always bound.
    pub prelude_operators: bool,
    pub entry: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            operator_fallback: OperatorFallback::Catalog,
            prelude_operators: true,
            entry: "main".to_owned(),
        }
    }
}

/// Lower a parsed module into a `CoreModule`.
pub fn lower_module(ast: &AstModule, options: &LowerOptions) -> Result<CoreModule, LowerError> {
    let mut lowerer = Lowerer {
        arena: CoreArena::new(),
        env: Env::new(),
        options,
    };
    let prelude = lowerer.seed_prelude();
    let scope = lowerer.env.push_scope(ScopeKind::Module, Some(prelude));
    lowerer.lower_block(scope, &ast.decls)?;

    let module = CoreModule {
        name: ast
            .name
            .as_ref()
            .map(|n| n.name.clone())
            .unwrap_or_else(|| "Main".to_owned()),
        arena: lowerer.arena,
        env: lowerer.env,
        prelude,
        scope,
        entry: options.entry.clone(),
    };
    check_filled(&module)?;
    debug!(
        "lowered module '{}': {} definitions, {} nodes",
        module.name,
        module.definitions().len(),
        module.arena.len()
    );
    if log_enabled!(Level::Trace) {
        for (name, id) in module.definitions() {
            if let Ok(text) = print_node(&module, id) {
                trace!("{} = {}", name, text);
            }
        }
    }
    Ok(module)
}

/// Verifies that nothing reachable from a top-level definition is `NoForm`.
fn check_filled(module: &CoreModule) -> Result<(), LowerError> {
    let mut seen = vec![false; module.arena.len()];
    let mut stack: Vec<NodeId> = module.definitions().iter().map(|(_, id)| *id).collect();
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut seen[id.0 as usize], true) {
            continue;
        }
        let kind = module.arena.kind(id);
        if *kind == NodeKind::NoForm {
            return Err(LowerError::UnfilledNode {
                name: module.arena.label(id),
            });
        }
        stack.extend(kind.children());
        if let NodeKind::Indirection(target) = kind {
            stack.push(*target);
        }
    }
    Ok(())
}

struct Lowerer<'o> {
    arena: CoreArena,
    env: Env,
    options: &'o LowerOptions,
}

impl<'o> Lowerer<'o> {
    /// Creates the root scope and binds the intrinsic catalog in it.
    fn seed_prelude(&mut self) -> ScopeId {
        let prelude = self.env.push_scope(ScopeKind::Prelude, None);
        for intrinsic in Intrinsic::ALL {
            for &name in intrinsic.source_names() {
                if is_operator_name(name)
                    && !(self.options.prelude_operators && PRELUDE_OPERATORS.contains(&name))
                {
                    continue;
                }
                let node = self
                    .arena
                    .alloc(NodeKind::Intrinsic(intrinsic), Some(name.to_owned()));
                self.env.bind(prelude, name, node);
            }
        }
        prelude
    }

    // -----------------------------------------------------------------------
    // Declaration blocks
    // -----------------------------------------------------------------------

    fn lower_block(&mut self, scope: ScopeId, decls: &[AstDecl]) -> Result<(), LowerError> {
        // Phase 1: reserve a slot per binding.
        let mut slots: Vec<(NodeId, &AstDecl)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for decl in decls {
            match decl {
                AstDecl::Function { name, .. } | AstDecl::Value { name, .. } => {
                    if !seen.insert(name.name.as_str()) {
                        return Err(LowerError::DuplicateDefinition {
                            name: name.name.clone(),
                            span: name.span,
                        });
                    }
                    let slot = self.arena.reserve(name.name.clone());
                    self.env.bind(scope, name.name.clone(), slot);
                    trace!("reserved {} for '{}'", slot, name.name);
                    slots.push((slot, decl));
                }
                AstDecl::Signature { names, .. } => {
                    trace!(
                        "ignoring type signature for {}",
                        names
                            .iter()
                            .map(|n| n.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                AstDecl::Unsupported { kind, span } => {
                    return Err(LowerError::Unsupported {
                        construct: kind.to_string(),
                        span: *span,
                    });
                }
            }
        }

        // Phase 2: lower bodies into their slots.
        for (slot, decl) in slots {
            let kind = match decl {
                AstDecl::Function { params, body, .. } => self.lower_lambda(scope, params, body)?,
                AstDecl::Value { body, .. } => self.lower_expr(scope, body)?,
                _ => continue,
            };
            self.arena.fill(slot, kind);
        }
        Ok(())
    }

    fn lower_lambda(
        &mut self,
        scope: ScopeId,
        params: &[Ident],
        body: &AstExpr,
    ) -> Result<NodeKind, LowerError> {
        let param_scope = self.env.push_scope(ScopeKind::Params, Some(scope));
        for (i, param) in params.iter().enumerate() {
            let placeholder = self
                .arena
                .alloc(NodeKind::Placeholder, Some(param.name.clone()));
            if param.name == "_" {
                // Wildcards occupy a position but cannot be referenced.
                self.env.bind(param_scope, format!("_@{}", i), placeholder);
                continue;
            }
            if self.env.bind(param_scope, param.name.clone(), placeholder).is_some() {
                return Err(LowerError::DuplicateDefinition {
                    name: param.name.clone(),
                    span: param.span,
                });
            }
        }
        let body = self.lower_child(param_scope, body)?;
        Ok(NodeKind::Lambda {
            params: param_scope,
            body,
        })
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn lower_child(&mut self, scope: ScopeId, expr: &AstExpr) -> Result<NodeId, LowerError> {
        let kind = self.lower_expr(scope, expr)?;
        Ok(self.arena.alloc(kind, None))
    }

    /// Lowers an expression to the contents of a node. The caller decides
    /// whether that node is fresh or a reserved slot.
    fn lower_expr(&mut self, scope: ScopeId, expr: &AstExpr) -> Result<NodeKind, LowerError> {
        match expr {
            AstExpr::Var(ident) if is_operator_name(&ident.name) => {
                self.operator_kind(scope, ident)
            }
            AstExpr::Var(ident) => {
                let target = self.resolve(scope, ident)?;
                Ok(NodeKind::Indirection(target))
            }
            AstExpr::Con(ident) => Ok(NodeKind::Constructor(ident.name.clone())),
            AstExpr::Lit { value, .. } => Ok(NodeKind::Literal(match value {
                AstLit::Int(n) => Literal::Int(*n),
                AstLit::Str(s) => Literal::Str(s.clone()),
            })),
            AstExpr::Neg { expr, .. } => {
                let func = self.arena.alloc(
                    NodeKind::Intrinsic(Intrinsic::Negate),
                    Some("negate".to_owned()),
                );
                let arg = self.lower_child(scope, expr)?;
                Ok(NodeKind::Application { func, arg })
            }
            AstExpr::BinOp { op, lhs, rhs, .. } => {
                let func = self.operator_kind(scope, op)?;
                let func = self.arena.alloc(func, None);
                let lhs = self.lower_child(scope, lhs)?;
                let partial = self.arena.alloc(NodeKind::Application { func, arg: lhs }, None);
                let rhs = self.lower_child(scope, rhs)?;
                Ok(NodeKind::Application {
                    func: partial,
                    arg: rhs,
                })
            }
            AstExpr::App { func, arg, .. } => {
                let func = self.lower_child(scope, func)?;
                let arg = self.lower_child(scope, arg)?;
                Ok(NodeKind::Application { func, arg })
            }
            AstExpr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.lower_child(scope, cond)?;
                let then_branch = self.lower_child(scope, then_branch)?;
                let else_branch = self.lower_child(scope, else_branch)?;
                Ok(NodeKind::Conditional {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            AstExpr::Let { decls, body, .. } => {
                let let_scope = self.env.push_scope(ScopeKind::Let, Some(scope));
                self.lower_block(let_scope, decls)?;
                let body = self.lower_expr(let_scope, body)?;
                self.env.release(let_scope);
                Ok(body)
            }
            AstExpr::Lambda { params, body, .. } => self.lower_lambda(scope, params, body),
            AstExpr::Case { span, .. }
            | AstExpr::Do { span }
            | AstExpr::Tuple { span, .. }
            | AstExpr::List { span, .. } => Err(LowerError::Unsupported {
                construct: expr.describe().to_owned(),
                span: *span,
            }),
        }
    }

    fn resolve(&self, scope: ScopeId, ident: &Ident) -> Result<NodeId, LowerError> {
        self.env
            .lookup(scope, &ident.name)
            .ok_or_else(|| LowerError::Unresolved {
                name: ident.name.clone(),
                scope: self.env.snapshot(scope),
                span: ident.span,
            })
    }

    /// Lowers a reference to an operator, infix or in parentheses: an
    /// indirection to its binding, or the intrinsic itself when the operator
    /// is unbound and the fallback allows it.
    fn operator_kind(&self, scope: ScopeId, op: &Ident) -> Result<NodeKind, LowerError> {
        if let Some(target) = self.env.lookup(scope, &op.name) {
            return Ok(NodeKind::Indirection(target));
        }
        let fallback = match self.options.operator_fallback {
            OperatorFallback::Catalog => Intrinsic::from_source_name(&op.name),
            OperatorFallback::Strict => None,
        };
        match fallback {
            Some(intrinsic) => {
                warn!(
                    "operator '{}' is not in scope; using intrinsic '{}'",
                    op.name, intrinsic
                );
                Ok(NodeKind::Intrinsic(intrinsic))
            }
            None => Err(LowerError::Unresolved {
                name: op.name.clone(),
                scope: self.env.snapshot(scope),
                span: op.span,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn lower(src: &str) -> CoreModule {
        let ast = parse_source(src).expect("parse failed");
        lower_module(&ast, &LowerOptions::default()).expect("lowering failed")
    }

    fn lower_err(src: &str, options: &LowerOptions) -> LowerError {
        let ast = parse_source(src).expect("parse failed");
        lower_module(&ast, options).unwrap_err()
    }

    #[test]
    fn references_share_the_definition_node() {
        let m = lower("main = f 3\nf x = x * 2\ng = f");
        let f = m.definition("f").expect("f defined");
        let g = m.definition("g").expect("g defined");
        assert_eq!(m.kind(g), &NodeKind::Indirection(f));

        let main = m.definition("main").expect("main defined");
        let NodeKind::Application { func, .. } = m.kind(main) else {
            panic!("main should be an application");
        };
        assert_eq!(m.kind(*func), &NodeKind::Indirection(f));
    }

    #[test]
    fn top_level_definitions_keep_source_order() {
        let m = lower("main = f 3\nf x = x * 2");
        let names: Vec<&str> = m.definitions().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["main", "f"]);
    }

    #[test]
    fn operators_resolve_to_prelude_intrinsics() {
        let m = lower("f x = x * 2");
        let f = m.definition("f").expect("f defined");
        let NodeKind::Lambda { body, .. } = m.kind(f) else {
            panic!("f should be a lambda");
        };
        let NodeKind::Application { func: partial, arg } = m.kind(*body) else {
            panic!("body should be an application");
        };
        assert_eq!(m.kind(*arg), &NodeKind::Literal(Literal::Int(2)));
        let NodeKind::Application { func: op, arg: lhs } = m.kind(*partial) else {
            panic!("expected nested application");
        };
        let NodeKind::Indirection(target) = m.kind(*op) else {
            panic!("operator should be an indirection");
        };
        assert_eq!(m.kind(*target), &NodeKind::Intrinsic(Intrinsic::Mult));
        let params = m.lambda_params(f);
        assert_eq!(m.kind(*lhs), &NodeKind::Indirection(params[0]));
    }

    #[test]
    fn let_bindings_are_shared_and_mutually_recursive() {
        let m = lower("main = let a = b\n           b = 1\n       in a + a");
        let main = m.definition("main").expect("main defined");
        let NodeKind::Application { func: partial, arg: rhs } = m.kind(main) else {
            panic!("main should be an application");
        };
        let NodeKind::Application { arg: lhs, .. } = m.kind(*partial) else {
            panic!("expected nested application");
        };
        assert_eq!(m.kind(*lhs), m.kind(*rhs));
        let NodeKind::Indirection(a) = m.kind(*lhs) else {
            panic!("a reference should be an indirection");
        };
        let NodeKind::Indirection(b) = m.kind(*a) else {
            panic!("a should refer to b");
        };
        assert_eq!(m.kind(*b), &NodeKind::Literal(Literal::Int(1)));
    }

    #[test]
    fn unresolved_identifier_reports_visible_scope() {
        let err = lower_err("main = f y\nf x = x", &LowerOptions::default());
        match err {
            LowerError::Unresolved { name, scope, .. } => {
                assert_eq!(name, "y");
                assert!(scope.contains("main"));
                assert!(scope.contains("f"));
                assert!(scope.contains("putStrLn"));
            }
            other => panic!("expected Unresolved, got {:?}", other),
        }
    }

    #[test]
    fn let_names_are_not_visible_outside() {
        let err = lower_err("main = (let t = 1 in t) + t", &LowerOptions::default());
        assert!(matches!(err, LowerError::Unresolved { ref name, .. } if name == "t"));
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let err = lower_err("f = 1\nf = 2", &LowerOptions::default());
        assert!(matches!(err, LowerError::DuplicateDefinition { ref name, .. } if name == "f"));
        let err = lower_err("f x x = x", &LowerOptions::default());
        assert!(matches!(err, LowerError::DuplicateDefinition { .. }));
    }

    #[test]
    fn unsupported_constructs_are_reported() {
        for (src, construct) in [
            ("main = case 1 of\n  x -> x", "case expression"),
            ("main = do\n  putStrLn \"a\"", "do block"),
            ("data T = A\nmain = 1", "data declaration"),
            ("main = [1, 2]", "list literal"),
            ("main = (1, 2)", "tuple"),
        ] {
            match lower_err(src, &LowerOptions::default()) {
                LowerError::Unsupported { construct: c, .. } => assert_eq!(c, construct),
                other => panic!("{}: expected Unsupported, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn catalog_fallback_synthesizes_unbound_operator() {
        let options = LowerOptions {
            prelude_operators: false,
            ..LowerOptions::default()
        };
        let ast = parse_source("main = 1 + 2").expect("parse failed");
        let m = lower_module(&ast, &options).expect("lowering failed");
        let main = m.definition("main").expect("main defined");
        let NodeKind::Application { func: partial, .. } = m.kind(main) else {
            panic!("main should be an application");
        };
        let NodeKind::Application { func: op, .. } = m.kind(*partial) else {
            panic!("expected nested application");
        };
        assert_eq!(m.kind(*op), &NodeKind::Intrinsic(Intrinsic::Plus));
    }

    #[test]
    fn strict_fallback_rejects_unbound_operator() {
        let options = LowerOptions {
            prelude_operators: false,
            operator_fallback: OperatorFallback::Strict,
            ..LowerOptions::default()
        };
        let err = lower_err("main = 1 + 2", &options);
        assert!(matches!(err, LowerError::Unresolved { ref name, .. } if name == "+"));
    }

    #[test]
    fn unknown_operator_is_unresolved_even_with_fallback() {
        let err = lower_err("main = 1 <+> 2", &LowerOptions::default());
        assert!(matches!(err, LowerError::Unresolved { ref name, .. } if name == "<+>"));
    }

    #[test]
    fn negation_applies_the_negate_intrinsic() {
        let m = lower("main = -5");
        let main = m.definition("main").expect("main defined");
        let NodeKind::Application { func, arg } = m.kind(main) else {
            panic!("negation should be an application");
        };
        assert_eq!(m.kind(*func), &NodeKind::Intrinsic(Intrinsic::Negate));
        assert_eq!(m.kind(*arg), &NodeKind::Literal(Literal::Int(5)));
    }

    #[test]
    fn operators_outside_the_prelude_use_the_fallback() {
        let m = lower("main = 1 < 2
lt = (<)");
        let main = m.definition("main").expect("main defined");
        let NodeKind::Application { func: partial, .. } = m.kind(main) else {
            panic!("main should be an application");
        };
        let NodeKind::Application { func: op, .. } = m.kind(*partial) else {
            panic!("expected nested application");
        };
        assert_eq!(m.kind(*op), &NodeKind::Intrinsic(Intrinsic::Lt));
        let lt = m.definition("lt").expect("lt defined");
        assert_eq!(m.kind(lt), &NodeKind::Intrinsic(Intrinsic::Lt));

        let strict = LowerOptions {
            operator_fallback: OperatorFallback::Strict,
            ..LowerOptions::default()
        };
        for src in ["main = 1 < 2", "main = (/=) 1 2", "main = 4 / 2"] {
            let err = lower_err(src, &strict);
            assert!(matches!(err, LowerError::Unresolved { .. }), "{}: {:?}", src, err);
        }
        let ast = parse_source("main = 1 + 2 * 3 == 7").expect("parse failed");
        assert!(lower_module(&ast, &strict).is_ok());
    }

    #[test]
    fn wildcard_parameters_count_towards_arity() {
        let m = lower("const a _ = a");
        let c = m.definition("const").expect("const defined");
        assert_eq!(m.lambda_params(c).len(), 2);
    }
}
