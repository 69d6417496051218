//! Schema discovery: walk a configuration type's field descriptors and derive
//! one flag per leaf and per optional field.
//!
//! The walk produces two views of the same information:
//!
//! - a flat map from flag-path to [`FlagMeta`], used by the binder and by
//!   help rendering;
//! - a tree of [`Node`]s mirroring the serde layout, used by the snapshot
//!   builder and the filler to line flag-paths up with values.
//!
//! Flag-paths are the lowercase dot-join of field segments. Embedded fields
//! contribute no segment.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::error::FlagError;
use crate::field::{Configuration, Field, FieldKind, LeafType, StructType};

/// How a flag takes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// A leaf; the value is parsed by the registry parser for `type_id`.
    Value,
    /// An optional field; presence activates it and `=false` leaves it off.
    /// A parser registered for the `Option` type itself takes the attached
    /// value instead.
    Toggle,
}

/// Metadata for one flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagMeta {
    pub path: String,
    pub kind: FlagKind,
    /// Type parsed by this flag's value. For toggles this is the `Option`
    /// type, so only a parser registered for the wrapper replaces the value.
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub short: Option<char>,
    pub description: String,
    pub optional: bool,
}

impl FlagMeta {
    /// Whether the flag can stand alone without a value (`--db`, `--watch`).
    pub fn is_switch(&self) -> bool {
        self.kind == FlagKind::Toggle || self.type_id == TypeId::of::<bool>()
    }
}

/// A schema field positioned in the value tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Serde key of the field inside its parent table.
    pub key: &'static str,
    /// Flag-path of the field. Embedded nodes carry their parent's path.
    pub path: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(LeafType),
    Optional(LeafType),
    Struct(StructType, Vec<Node>),
    OptionalStruct(StructType, Vec<Node>),
    Embedded(StructType, Vec<Node>),
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Struct(_, c) | NodeKind::OptionalStruct(_, c) | NodeKind::Embedded(_, c) => c,
            NodeKind::Leaf(_) | NodeKind::Optional(_) => &[],
        }
    }
}

/// Everything discovered about one configuration type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    flags: BTreeMap<String, FlagMeta>,
    shorts: BTreeMap<char, String>,
    nodes: Vec<Node>,
}

impl Schema {
    /// Discover the schema of `C`.
    ///
    /// Fails if a described field is private, if two fields end up with the
    /// same flag-path or short name, or if an optional struct contains itself.
    pub fn of<C: Configuration>() -> Result<Self, FlagError> {
        Self::from_fields(C::fields(), std::any::type_name::<C>(), TypeId::of::<C>())
    }

    pub fn from_fields(
        fields: Vec<Field>,
        type_name: &str,
        type_id: TypeId,
    ) -> Result<Self, FlagError> {
        let mut schema = Schema::default();
        let mut ancestors = vec![type_id];
        schema.nodes = schema.walk(fields, "", &mut ancestors)?;
        log::debug!("schema for {type_name}: {} flags", schema.flags.len());
        Ok(schema)
    }

    fn walk(
        &mut self,
        fields: Vec<Field>,
        prefix: &str,
        ancestors: &mut Vec<TypeId>,
    ) -> Result<Vec<Node>, FlagError> {
        let mut nodes = Vec::new();
        for field in fields {
            // Embedded structs are always flattened; their own annotation
            // and visibility do not matter.
            if let FieldKind::Embedded(inner) = field.kind {
                let children = self.descend(&inner, prefix, ancestors)?;
                nodes.push(Node {
                    key: field.name,
                    path: prefix.to_string(),
                    kind: NodeKind::Embedded(inner, children),
                });
                continue;
            }

            let Some(description) = field.description else {
                log::trace!("skipping undescribed field {}", field.name);
                continue;
            };
            if !field.exported {
                return Err(FlagError::UnexportedField {
                    field: field.name.to_string(),
                });
            }

            let path = join(prefix, &field.segment());
            let kind = match field.kind {
                FieldKind::Leaf(t) => {
                    self.insert(&field, &path, description, FlagKind::Value, t.type_id, t.type_name)?;
                    NodeKind::Leaf(t)
                }
                FieldKind::Optional(t) => {
                    self.insert(&field, &path, description, FlagKind::Toggle, t.option_id, t.option_name)?;
                    NodeKind::Optional(t)
                }
                FieldKind::Struct(s) => {
                    let children = self.descend(&s, &path, ancestors)?;
                    NodeKind::Struct(s, children)
                }
                FieldKind::OptionalStruct(s) => {
                    self.insert(&field, &path, description, FlagKind::Toggle, s.option_id, s.option_name)?;
                    let children = self.descend(&s, &path, ancestors)?;
                    NodeKind::OptionalStruct(s, children)
                }
                FieldKind::Embedded(_) => unreachable!("embedded fields handled above"),
            };
            nodes.push(Node {
                key: field.name,
                path,
                kind,
            });
        }
        Ok(nodes)
    }

    fn descend(
        &mut self,
        inner: &StructType,
        path: &str,
        ancestors: &mut Vec<TypeId>,
    ) -> Result<Vec<Node>, FlagError> {
        if ancestors.contains(&inner.type_id) {
            return Err(FlagError::RecursiveType {
                type_name: inner.type_name.to_string(),
                path: path.to_string(),
            });
        }
        ancestors.push(inner.type_id);
        let children = self.walk(inner.fields(), path, ancestors);
        ancestors.pop();
        children
    }

    fn insert(
        &mut self,
        field: &Field,
        path: &str,
        description: &str,
        kind: FlagKind,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<(), FlagError> {
        let short = field.short.map(|c| c.to_ascii_lowercase());
        if let Some(c) = short {
            if let Some(first) = self.shorts.get(&c) {
                return Err(FlagError::DuplicateShort {
                    short: c,
                    first: first.clone(),
                    second: path.to_string(),
                });
            }
            self.shorts.insert(c, path.to_string());
        }

        match self.flags.entry(path.to_string()) {
            Entry::Occupied(_) => Err(FlagError::DuplicateFlag {
                path: path.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(FlagMeta {
                    path: path.to_string(),
                    kind,
                    type_id,
                    type_name,
                    short,
                    description: description.to_string(),
                    optional: field.kind.is_optional(),
                });
                Ok(())
            }
        }
    }

    /// Flags ordered by path.
    pub fn flags(&self) -> impl Iterator<Item = &FlagMeta> {
        self.flags.values()
    }

    pub fn flag(&self, path: &str) -> Option<&FlagMeta> {
        self.flags.get(path)
    }

    pub fn by_short(&self, c: char) -> Option<&FlagMeta> {
        self.shorts.get(&c).and_then(|path| self.flags.get(path))
    }

    pub fn paths(&self) -> Vec<String> {
        self.flags.keys().cloned().collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

pub(crate) fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{
        DatabaseInfo, RepeatedConfig, ServerInfo, TestConfig, UnexportedConfig,
    };
    use crate::types::{Duration, Timestamp};
    use serde::{Deserialize, Serialize};

    #[test]
    fn discovers_every_flag() {
        let schema = Schema::of::<TestConfig>().unwrap();
        let expected = [
            "db",
            "db.comax",
            "db.connection_max64",
            "db.ip",
            "db.load",
            "db.load64",
            "db.watch",
            "log_level",
            "owner",
            "owner.dob",
            "owner.name",
            "owner.rate",
            "owner.servers",
            "timeout",
        ];
        assert_eq!(schema.paths(), expected);
    }

    #[test]
    fn flag_types() {
        let schema = Schema::of::<TestConfig>().unwrap();
        let ty = |p: &str| schema.flag(p).unwrap().type_id;
        assert_eq!(ty("log_level"), TypeId::of::<String>());
        assert_eq!(ty("timeout"), TypeId::of::<Duration>());
        assert_eq!(ty("db.watch"), TypeId::of::<bool>());
        assert_eq!(ty("db.load64"), TypeId::of::<i64>());
        assert_eq!(ty("db.comax"), TypeId::of::<u32>());
        assert_eq!(ty("owner.dob"), TypeId::of::<Timestamp>());
        assert_eq!(ty("owner.servers"), TypeId::of::<Vec<ServerInfo>>());
    }

    #[test]
    fn optional_fields_are_toggles() {
        let schema = Schema::of::<TestConfig>().unwrap();
        let toggles: Vec<_> = schema
            .flags()
            .filter(|f| f.kind == FlagKind::Toggle)
            .map(|f| f.path.as_str())
            .collect();
        assert_eq!(toggles, ["db", "owner", "owner.name"]);
        assert!(schema.flag("db").unwrap().optional);
        assert_eq!(
            schema.flag("db").unwrap().type_id,
            TypeId::of::<Option<DatabaseInfo>>()
        );
        assert_eq!(
            schema.flag("owner.name").unwrap().type_id,
            TypeId::of::<Option<String>>()
        );
    }

    #[test]
    fn switches_include_bool_leaves() {
        let schema = Schema::of::<TestConfig>().unwrap();
        let switches: Vec<_> = schema
            .flags()
            .filter(|f| f.is_switch())
            .map(|f| f.path.as_str())
            .collect();
        assert_eq!(switches, ["db", "db.watch", "owner", "owner.name"]);
    }

    #[test]
    fn short_and_description() {
        let schema = Schema::of::<TestConfig>().unwrap();
        let flag = schema.by_short('l').unwrap();
        assert_eq!(flag.path, "log_level");
        assert_eq!(flag.description, "Log level");
    }

    #[test]
    fn embedded_contributes_no_segment() {
        let schema = Schema::of::<TestConfig>().unwrap();
        assert!(schema.flag("db.watch").is_some());
        assert!(schema.flag("db.server_info.watch").is_none());
        let db = schema
            .nodes()
            .iter()
            .find(|n| n.path == "db")
            .unwrap();
        let embedded = &db.children()[0];
        assert!(matches!(embedded.kind, NodeKind::Embedded(..)));
        assert_eq!(embedded.path, "db");
        assert_eq!(embedded.key, "server_info");
    }

    #[test]
    fn repeated_type_gets_independent_paths() {
        let schema = Schema::of::<RepeatedConfig>().unwrap();
        assert_eq!(
            schema.paths(),
            [
                "container",
                "container.repeated",
                "container.repeated.val",
                "repeated",
                "repeated.val"
            ]
        );
    }

    #[test]
    fn unexported_described_field_is_fatal() {
        let err = Schema::of::<UnexportedConfig>().unwrap_err();
        assert!(err.to_string().contains("field other is an unexported field"));
    }

    #[derive(Serialize, Deserialize, Default)]
    struct Quiet {
        shown: String,
        hidden: String,
    }

    impl Configuration for Quiet {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("shown").description("Shown"),
                Field::leaf::<String>("hidden").private(),
            ]
        }
    }

    #[test]
    fn unexported_undescribed_field_is_skipped() {
        let schema = Schema::of::<Quiet>().unwrap();
        assert_eq!(schema.paths(), ["shown"]);
    }

    #[derive(Serialize, Deserialize, Default)]
    struct Colliding {
        log_level: String,
        other: String,
    }

    impl Configuration for Colliding {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("log_level").description("a"),
                Field::leaf::<String>("other").long("LOG_LEVEL").description("b"),
            ]
        }
    }

    #[test]
    fn colliding_paths_are_rejected() {
        let err = Schema::of::<Colliding>().unwrap_err();
        assert!(matches!(err, FlagError::DuplicateFlag { path } if path == "log_level"));
    }

    #[derive(Serialize, Deserialize, Default)]
    struct ShortClash {
        a: String,
        b: String,
    }

    impl Configuration for ShortClash {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("a").short('x').description("a"),
                Field::leaf::<String>("b").short('X').description("b"),
            ]
        }
    }

    #[test]
    fn colliding_shorts_are_rejected() {
        let err = Schema::of::<ShortClash>().unwrap_err();
        assert!(matches!(err, FlagError::DuplicateShort { short: 'x', .. }));
    }

    #[derive(Serialize, Deserialize, Default)]
    struct Chain {
        label: String,
        next: Option<Box<Chain>>,
    }

    impl Configuration for Chain {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("label").description("Label"),
                Field::optional_nested::<Chain>("next").description("Next link"),
            ]
        }
    }

    #[test]
    fn self_containing_type_is_rejected() {
        let err = Schema::of::<Chain>().unwrap_err();
        assert!(matches!(err, FlagError::RecursiveType { path, .. } if path == "next"));
    }
}
