use crate::ir::node::{CoreArena, NodeId, NodeKind};
use crate::ir::scope::{Env, ScopeId};

/// The lowered program: the node arena, the scope chain and the module
/// scope whose bindings are the top-level definitions.
///
/// Invariants after lowering:
/// - no node reachable from a top-level definition is `NoForm`;
/// - each top-level name maps to exactly one node, and every reference to
///   it is an `Indirection` to that node;
/// - the module scope's parent is the prelude (intrinsic) scope.
#[derive(Debug)]
pub struct CoreModule {
    pub name: String,
    pub arena: CoreArena,
    pub env: Env,
    pub prelude: ScopeId,
    pub scope: ScopeId,
    /// Name of the entry definition (`main` by default).
    pub entry: String,
}

impl CoreModule {
    /// Top-level definitions in source order. Drives every whole-program
    /// pass (printing, JSON export, closure conversion).
    pub fn definitions(&self) -> Vec<(&str, NodeId)> {
        self.env
            .list_names(self.scope, false)
            .into_iter()
            .filter_map(|name| self.env.lookup_local(self.scope, name).map(|id| (name, id)))
            .collect()
    }

    pub fn definition(&self, name: &str) -> Option<NodeId> {
        self.env.lookup_local(self.scope, name)
    }

    pub fn is_definition(&self, id: NodeId) -> bool {
        self.env.bindings(self.scope).any(|(_, node)| node == id)
    }

    /// Parameter placeholders of a lambda node, in declaration order. Empty
    /// for anything that is not a lambda.
    pub fn lambda_params(&self, id: NodeId) -> Vec<NodeId> {
        match self.arena.kind(id) {
            NodeKind::Lambda { params, .. } => {
                self.env.bindings(*params).map(|(_, node)| node).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.arena.kind(id)
    }
}
