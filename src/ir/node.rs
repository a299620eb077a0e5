use crate::ir::intrinsic::Intrinsic;
use crate::ir::scope::ScopeId;

/// Index of a node in a [`CoreArena`]. Identity is the index: two references
/// to the same definition share one `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Reserved slot not yet filled. Never present after lowering succeeds.
    NoForm,
    /// A lambda parameter.
    Placeholder,
    Constructor(String),
    /// A reference to another node (a definition, parameter or intrinsic).
    /// The target is not owned; this edge is what makes the IR a graph.
    Indirection(NodeId),
    Intrinsic(Intrinsic),
    Application {
        func: NodeId,
        arg: NodeId,
    },
    /// `params` is the lambda's own scope; its bindings are the parameter
    /// placeholders in declaration order.
    Lambda {
        params: ScopeId,
        body: NodeId,
    },
    Literal(Literal),
    Conditional {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },
}

impl NodeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::NoForm => "no_form",
            NodeKind::Placeholder => "placeholder",
            NodeKind::Constructor(_) => "constructor",
            NodeKind::Indirection(_) => "indirection",
            NodeKind::Intrinsic(_) => "intrinsic",
            NodeKind::Application { .. } => "application",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::Literal(_) => "literal",
            NodeKind::Conditional { .. } => "conditional",
        }
    }

    /// Nodes this node owns (excludes the target of an indirection).
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Application { func, arg } => vec![*func, *arg],
            NodeKind::Lambda { body, .. } => vec![*body],
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => vec![*cond, *then_branch, *else_branch],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Debug name: the binding this node was created for, if any.
    pub name: Option<String>,
}

/// Owns every core node of a compilation.
#[derive(Debug, Default)]
pub struct CoreArena {
    nodes: Vec<Node>,
}

impl CoreArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, name: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, name });
        id
    }

    /// Reserves a `NoForm` slot whose identity can be referenced before its
    /// contents are known.
    pub fn reserve(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::NoForm, Some(name.into()))
    }

    /// Fills a reserved slot in place, keeping its identity and name.
    pub fn fill(&mut self, id: NodeId, kind: NodeKind) {
        let node = &mut self.nodes[id.0 as usize];
        debug_assert!(
            node.kind == NodeKind::NoForm,
            "slot {} filled twice",
            id
        );
        node.kind = kind;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0 as usize].name.as_deref()
    }

    /// Debug name or the node id, for messages.
    pub fn label(&self, id: NodeId) -> String {
        self.name(id)
            .map(str::to_owned)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Follows a chain of indirections to the first node that is not one.
    /// Stops on a cycle and returns the node where the cycle was detected.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        let mut steps = 0;
        while let NodeKind::Indirection(target) = self.kind(id) {
            if steps > self.nodes.len() {
                break;
            }
            id = *target;
            steps += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_slot_keeps_identity_when_filled() {
        let mut arena = CoreArena::new();
        let slot = arena.reserve("f");
        let reference = arena.alloc(NodeKind::Indirection(slot), None);
        arena.fill(slot, NodeKind::Literal(Literal::Int(1)));
        assert_eq!(arena.kind(reference), &NodeKind::Indirection(slot));
        assert_eq!(arena.kind(slot), &NodeKind::Literal(Literal::Int(1)));
        assert_eq!(arena.name(slot), Some("f"));
    }

    #[test]
    fn resolve_follows_chains_and_stops_on_cycles() {
        let mut arena = CoreArena::new();
        let lit = arena.alloc(NodeKind::Literal(Literal::Int(7)), None);
        let a = arena.alloc(NodeKind::Indirection(lit), None);
        let b = arena.alloc(NodeKind::Indirection(a), None);
        assert_eq!(arena.resolve(b), lit);

        let x = arena.reserve("x");
        let y = arena.alloc(NodeKind::Indirection(x), None);
        arena.fill(x, NodeKind::Indirection(y));
        let end = arena.resolve(x);
        assert!(matches!(arena.kind(end), NodeKind::Indirection(_)));
    }
}
