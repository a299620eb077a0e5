use indexmap::IndexMap;

use crate::ir::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Root scope holding the intrinsic catalog.
    Prelude,
    Module,
    Let,
    /// Parameters of one lambda.
    Params,
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScopeKind::Prelude => "prelude",
            ScopeKind::Module => "module",
            ScopeKind::Let => "let",
            ScopeKind::Params => "lambda",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    bindings: IndexMap<String, NodeId>,
}

/// Lexical scope chain. Scopes live in an arena and point at their parent;
/// a binding maps a name to a node in the core arena.
#[derive(Debug, Default)]
pub struct Env {
    scopes: Vec<Scope>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            kind,
            bindings: IndexMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scope(id).parent
    }

    /// Binds `name` in `scope`, replacing an existing binding of the same
    /// name in that scope (its position is kept). Returns the replaced node.
    pub fn bind(&mut self, scope: ScopeId, name: impl Into<String>, node: NodeId) -> Option<NodeId> {
        self.scopes[scope.0 as usize]
            .bindings
            .insert(name.into(), node)
    }

    /// Looks `name` up in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        self.scope(scope).bindings.get(name).copied()
    }

    /// Looks `name` up in `scope`, then in each enclosing scope.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(node) = self.lookup_local(id, name) {
                return Some(node);
            }
            current = self.parent(id);
        }
        None
    }

    /// Bindings of one scope in insertion order.
    pub fn bindings(&self, scope: ScopeId) -> impl Iterator<Item = (&str, NodeId)> {
        self.scope(scope)
            .bindings
            .iter()
            .map(|(name, node)| (name.as_str(), *node))
    }

    /// Names visible from `scope`: its own in insertion order, then (when
    /// `recursive`) those of each enclosing scope.
    pub fn list_names(&self, scope: ScopeId, recursive: bool) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            names.extend(self.scope(id).bindings.keys().map(String::as_str));
            if !recursive {
                break;
            }
            current = self.parent(id);
        }
        names
    }

    /// Drops the name table of a finished `let` scope. Nodes it bound stay in
    /// the core arena and remain reachable through indirections.
    pub fn release(&mut self, scope: ScopeId) {
        self.scopes[scope.0 as usize].bindings = IndexMap::new();
    }

    pub fn snapshot(&self, scope: ScopeId) -> ScopeSnapshot {
        let mut frames = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            frames.push(ScopeFrame {
                kind: s.kind,
                names: s.bindings.keys().cloned().collect(),
            });
            current = s.parent;
        }
        ScopeSnapshot { frames }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    pub kind: ScopeKind,
    pub names: Vec<String>,
}

/// Names visible at a program point, innermost scope first. Carried by
/// unresolved-identifier errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSnapshot {
    pub frames: Vec<ScopeFrame>,
}

impl ScopeSnapshot {
    pub fn contains(&self, name: &str) -> bool {
        self.frames
            .iter()
            .any(|f| f.names.iter().any(|n| n == name))
    }
}

impl std::fmt::Display for ScopeSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for frame in &self.frames {
            if !first {
                f.write_str(" <- ")?;
            }
            first = false;
            if frame.kind == ScopeKind::Prelude {
                write!(f, "prelude: {} names", frame.names.len())?;
            } else {
                write!(f, "{}: [{}]", frame.kind, frame.names.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward_and_inner_shadows() {
        let mut env = Env::new();
        let outer = env.push_scope(ScopeKind::Module, None);
        let inner = env.push_scope(ScopeKind::Let, Some(outer));
        env.bind(outer, "x", NodeId(1));
        env.bind(outer, "y", NodeId(2));
        env.bind(inner, "x", NodeId(3));
        assert_eq!(env.lookup(inner, "x"), Some(NodeId(3)));
        assert_eq!(env.lookup(inner, "y"), Some(NodeId(2)));
        assert_eq!(env.lookup(outer, "x"), Some(NodeId(1)));
        assert_eq!(env.lookup(inner, "z"), None);
    }

    #[test]
    fn rebinding_replaces_in_place() {
        let mut env = Env::new();
        let s = env.push_scope(ScopeKind::Module, None);
        env.bind(s, "a", NodeId(0));
        env.bind(s, "b", NodeId(1));
        assert_eq!(env.bind(s, "a", NodeId(5)), Some(NodeId(0)));
        assert_eq!(env.list_names(s, false), vec!["a", "b"]);
        assert_eq!(env.lookup(s, "a"), Some(NodeId(5)));
    }

    #[test]
    fn list_names_in_insertion_order_then_parents() {
        let mut env = Env::new();
        let root = env.push_scope(ScopeKind::Prelude, None);
        let module = env.push_scope(ScopeKind::Module, Some(root));
        env.bind(root, "+", NodeId(0));
        env.bind(module, "main", NodeId(1));
        env.bind(module, "f", NodeId(2));
        assert_eq!(env.list_names(module, false), vec!["main", "f"]);
        assert_eq!(env.list_names(module, true), vec!["main", "f", "+"]);
    }

    #[test]
    fn released_scope_forgets_names() {
        let mut env = Env::new();
        let module = env.push_scope(ScopeKind::Module, None);
        let local = env.push_scope(ScopeKind::Let, Some(module));
        env.bind(local, "t", NodeId(4));
        env.release(local);
        assert_eq!(env.lookup_local(local, "t"), None);
        assert!(env.list_names(local, false).is_empty());
    }

    #[test]
    fn snapshot_lists_frames_innermost_first() {
        let mut env = Env::new();
        let root = env.push_scope(ScopeKind::Prelude, None);
        let module = env.push_scope(ScopeKind::Module, Some(root));
        env.bind(module, "main", NodeId(0));
        let snap = env.snapshot(module);
        assert_eq!(snap.frames.len(), 2);
        assert!(snap.contains("main"));
        assert_eq!(snap.to_string(), "module: [main] <- prelude: 0 names");
    }
}
