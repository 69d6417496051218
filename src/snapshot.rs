//! Default snapshot: the best-available default for every flag-path.
//!
//! Built by walking the schema tree against the defaults template. The
//! snapshot only records what *could* be used; whether an optional value is
//! ever surfaced is decided by the filler.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::FlagError;
use crate::field::{Configuration, Table, to_table};
use crate::schema::{Node, NodeKind, Schema};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn build<C: Configuration>(schema: &Schema, template: &C) -> Result<Self, FlagError> {
        let table = to_table(template)?;
        let snapshot = Self::from_nodes(schema.nodes(), Some(&table));
        log::debug!("snapshot holds {} defaults", snapshot.len());
        Ok(snapshot)
    }

    /// Snapshot a subtree. Node paths are absolute, so the result can be
    /// consulted with the same keys as a whole-tree snapshot.
    pub fn from_nodes(nodes: &[Node], template: Option<&Table>) -> Self {
        let mut snapshot = Snapshot::default();
        snapshot.record(nodes, template);
        snapshot
    }

    fn record(&mut self, nodes: &[Node], template: Option<&Table>) {
        for node in nodes {
            // `None` serializes as null: treat it as absent.
            let current = template
                .and_then(|t| t.get(node.key))
                .filter(|v| !v.is_null());
            match &node.kind {
                NodeKind::Leaf(t) | NodeKind::Optional(t) => {
                    if let Some(value) = current.cloned().or_else(|| t.zero()) {
                        self.values.insert(node.path.clone(), value);
                    }
                }
                NodeKind::Struct(s, children) | NodeKind::OptionalStruct(s, children) => {
                    match current {
                        Some(value) => {
                            self.values.insert(node.path.clone(), value.clone());
                            self.record(children, value.as_object());
                        }
                        // Absent template: zero here, and zero for every
                        // descendant. Template data is never consulted below.
                        None => {
                            if let Some(zero) = s.zero() {
                                self.values.insert(node.path.clone(), zero);
                            }
                            self.record(children, None);
                        }
                    }
                }
                NodeKind::Embedded(_, children) => {
                    self.record(children, current.and_then(Value::as_object));
                }
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
