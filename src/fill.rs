//! Fill the target from bound flags and the default snapshot.
//!
//! Plain fields take the bound value, else the snapshot value, else zero.
//! Optional fields are only materialized when activated: their own flag or
//! any flag below them was bound. Default data alone never creates one.

use serde_json::Value;

use crate::args::{Bindings, Bound};
use crate::error::FlagError;
use crate::field::{Configuration, Table, from_table, to_table};
use crate::schema::{Node, NodeKind, Schema};
use crate::snapshot::Snapshot;

/// Rewrite `target` in place. Fields outside the schema keep their values.
pub fn fill<C: Configuration>(
    target: &mut C,
    schema: &Schema,
    snapshot: &Snapshot,
    bindings: &Bindings,
) -> Result<(), FlagError> {
    let mut table = to_table(target)?;
    fill_nodes(&mut table, schema.nodes(), snapshot, bindings);
    *target = from_table(table)?;
    Ok(())
}

fn fill_nodes(table: &mut Table, nodes: &[Node], snapshot: &Snapshot, bindings: &Bindings) {
    for node in nodes {
        let path = node.path.as_str();
        match &node.kind {
            NodeKind::Leaf(t) => {
                let value = bindings
                    .get(path)
                    .and_then(Bound::value)
                    .or_else(|| snapshot.get(path).cloned())
                    .or_else(|| t.zero());
                if let Some(value) = value {
                    table.insert(node.key.to_string(), value);
                }
            }
            NodeKind::Optional(t) => {
                let value = match bindings.get(path) {
                    Some(Bound::Value(parser)) => Some(parser.get()),
                    Some(Bound::Toggle(true)) => snapshot.get(path).cloned().or_else(|| t.zero()),
                    Some(Bound::Toggle(false)) | None => None,
                };
                match value.filter(|v| !v.is_null()) {
                    Some(value) => {
                        table.insert(node.key.to_string(), value);
                    }
                    None => {
                        table.remove(node.key);
                    }
                }
            }
            NodeKind::Struct(s, children) | NodeKind::Embedded(s, children) => {
                let mut inner = match table.remove(node.key) {
                    Some(Value::Object(inner)) => inner,
                    _ => zero_table(snapshot.get(path).cloned().or_else(|| s.zero())),
                };
                fill_nodes(&mut inner, children, snapshot, bindings);
                table.insert(node.key.to_string(), Value::Object(inner));
            }
            NodeKind::OptionalStruct(s, children) => {
                let own = bindings.get(path);
                let active = own.is_some_and(Bound::is_active) || bindings.has_descendant(path);
                if !active {
                    table.remove(node.key);
                    continue;
                }
                log::trace!("activating {path}");
                let value = match own {
                    // A custom value replaces the whole sub-object; its
                    // content becomes the defaults for the children.
                    Some(Bound::Value(parser)) => match parser.get() {
                        Value::Object(mut inner) => {
                            let scoped = Snapshot::from_nodes(children, Some(&inner));
                            fill_nodes(&mut inner, children, &scoped, bindings);
                            Value::Object(inner)
                        }
                        other => other,
                    },
                    _ => {
                        let content = snapshot.get(path).cloned().or_else(|| s.zero());
                        let mut inner = zero_table(content);
                        fill_nodes(&mut inner, children, snapshot, bindings);
                        Value::Object(inner)
                    }
                };
                if value.is_null() {
                    table.remove(node.key);
                } else {
                    table.insert(node.key.to_string(), value);
                }
            }
        }
    }
}

fn zero_table(value: Option<Value>) -> Table {
    match value {
        Some(Value::Object(table)) => table,
        _ => Table::new(),
    }
}
