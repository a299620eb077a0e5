//! JSON export of a `CoreModule`.
//!
//! ```text
//! { "module": str, "entry": str,
//!   "definitions": [{ "name": str, "node": u32 }],
//!   "nodes": [{ "id": u32, "name": str|null, "kind": str, ...fields }] }
//! ```
//!
//! Only nodes reachable from a top-level definition are exported, in
//! ascending id order. Indirection targets are exported by id and followed,
//! so shared definitions appear once.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::ir::module::CoreModule;
use crate::ir::node::{Literal, NodeId, NodeKind};

pub fn core_to_json(module: &CoreModule) -> Value {
    let mut reachable = BTreeSet::new();
    let mut stack: Vec<NodeId> = module.definitions().iter().map(|(_, id)| *id).collect();
    while let Some(id) = stack.pop() {
        if !reachable.insert(id) {
            continue;
        }
        let kind = module.arena.kind(id);
        stack.extend(kind.children());
        if let NodeKind::Indirection(target) = kind {
            stack.push(*target);
        }
        if let NodeKind::Lambda { .. } = kind {
            stack.extend(module.lambda_params(id));
        }
    }

    let nodes: Vec<Value> = reachable
        .into_iter()
        .map(|id| node_to_json(module, id))
        .collect();
    let definitions: Vec<Value> = module
        .definitions()
        .into_iter()
        .map(|(name, id)| json!({ "name": name, "node": id.0 }))
        .collect();

    json!({
        "module": module.name,
        "entry": module.entry,
        "definitions": definitions,
        "nodes": nodes,
    })
}

pub fn core_to_json_string(module: &CoreModule) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(&core_to_json(module)).unwrap_or_default()
}

fn node_to_json(module: &CoreModule, id: NodeId) -> Value {
    let node = module.arena.node(id);
    let mut obj = json!({
        "id": id.0,
        "name": node.name,
        "kind": node.kind.tag(),
    });
    let fields = match &node.kind {
        NodeKind::NoForm | NodeKind::Placeholder => json!({}),
        NodeKind::Constructor(name) => json!({ "constructor": name }),
        NodeKind::Indirection(target) => json!({ "target": target.0 }),
        NodeKind::Intrinsic(i) => json!({ "intrinsic": i.name(), "arity": i.arity() }),
        NodeKind::Application { func, arg } => json!({ "func": func.0, "arg": arg.0 }),
        NodeKind::Lambda { body, .. } => {
            let params: Vec<u32> = module.lambda_params(id).iter().map(|p| p.0).collect();
            json!({ "params": params, "body": body.0 })
        }
        NodeKind::Literal(Literal::Int(n)) => json!({ "int": n }),
        NodeKind::Literal(Literal::Str(s)) => json!({ "string": s }),
        NodeKind::Conditional {
            cond,
            then_branch,
            else_branch,
        } => json!({ "cond": cond.0, "then": then_branch.0, "else": else_branch.0 }),
    };
    if let (Some(target), Value::Object(extra)) = (obj.as_object_mut(), fields) {
        target.extend(extra);
    }
    obj
}
