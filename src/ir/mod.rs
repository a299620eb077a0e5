pub mod intrinsic;
pub mod module;
pub mod node;
pub mod printer;
pub mod scope;
pub mod serial;

pub use intrinsic::Intrinsic;
pub use module::CoreModule;
pub use node::{CoreArena, Literal, Node, NodeId, NodeKind};
pub use scope::{Env, ScopeId, ScopeKind, ScopeSnapshot};
