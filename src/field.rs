//! Field descriptors: how a configuration type reports its own shape.
//!
//! Rust has no runtime reflection over struct fields, so each configuration
//! type lists its fields once through [`Configuration::fields`]. Values still
//! travel through serde, so the descriptor `name` must match the serde key of
//! the field.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize, Default)]
//! struct Settings {
//!     log_level: String,
//!     retries: Option<Retry>,
//! }
//!
//! impl Configuration for Settings {
//!     fn fields() -> Vec<Field> {
//!         vec![
//!             Field::leaf::<String>("log_level").short('l').description("Log level"),
//!             Field::optional_nested::<Retry>("retries").description("Enable retries"),
//!         ]
//!     }
//! }
//! ```

use std::any::{TypeId, type_name};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::FlagError;

/// The dynamic form of a struct: serde key to value.
pub(crate) type Table = Map<String, Value>;

/// A struct whose fields can be materialized from defaults and flags.
pub trait Configuration: Serialize + DeserializeOwned + 'static {
    fn fields() -> Vec<Field>;
}

/// The type of a leaf value, plus a way to produce its zero value.
#[derive(Debug, Clone, Copy)]
pub struct LeafType {
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// `Option<T>`, the key for parsers that replace an optional leaf whole.
    pub option_id: TypeId,
    pub option_name: &'static str,
    zero: fn() -> Option<Value>,
}

impl LeafType {
    pub fn of<T: Serialize + Default + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            option_id: TypeId::of::<Option<T>>(),
            option_name: type_name::<Option<T>>(),
            zero: zero_of::<T>,
        }
    }

    pub fn zero(&self) -> Option<Value> {
        (self.zero)()
    }
}

/// A nested configuration struct type.
#[derive(Debug, Clone, Copy)]
pub struct StructType {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub option_id: TypeId,
    pub option_name: &'static str,
    fields: fn() -> Vec<Field>,
    zero: fn() -> Option<Value>,
}

impl StructType {
    pub fn of<S: Configuration + Default>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: type_name::<S>(),
            option_id: TypeId::of::<Option<S>>(),
            option_name: type_name::<Option<S>>(),
            fields: S::fields,
            zero: zero_of::<S>,
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        (self.fields)()
    }

    pub fn zero(&self) -> Option<Value> {
        (self.zero)()
    }
}

fn zero_of<T: Serialize + Default>() -> Option<Value> {
    serde_json::to_value(T::default()).ok()
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A plain value with a registered parser.
    Leaf(LeafType),
    /// `Option<T>` of a leaf type.
    Optional(LeafType),
    /// A nested struct held by value.
    Struct(StructType),
    /// `Option<S>` of a nested struct.
    OptionalStruct(StructType),
    /// A struct whose fields are flattened into the parent's flag namespace.
    Embedded(StructType),
}

impl FieldKind {
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldKind::Optional(_) | FieldKind::OptionalStruct(_))
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            FieldKind::Leaf(t) | FieldKind::Optional(t) => t.type_id,
            FieldKind::Struct(s) | FieldKind::OptionalStruct(s) | FieldKind::Embedded(s) => {
                s.type_id
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Leaf(t) | FieldKind::Optional(t) => t.type_name,
            FieldKind::Struct(s) | FieldKind::OptionalStruct(s) | FieldKind::Embedded(s) => {
                s.type_name
            }
        }
    }

    pub fn zero(&self) -> Option<Value> {
        match self {
            FieldKind::Leaf(t) | FieldKind::Optional(t) => t.zero(),
            FieldKind::Struct(s) | FieldKind::OptionalStruct(s) | FieldKind::Embedded(s) => {
                s.zero()
            }
        }
    }
}

/// One declared field of a configuration struct.
///
/// Fields without a [`description`](Field::description) are not flags; they
/// keep whatever value the target already holds.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: Option<&'static str>,
    pub short: Option<char>,
    pub long: Option<&'static str>,
    pub exported: bool,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            description: None,
            short: None,
            long: None,
            exported: true,
        }
    }

    pub fn leaf<T: Serialize + Default + 'static>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Leaf(LeafType::of::<T>()))
    }

    pub fn optional<T: Serialize + Default + 'static>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Optional(LeafType::of::<T>()))
    }

    pub fn nested<S: Configuration + Default>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Struct(StructType::of::<S>()))
    }

    pub fn optional_nested<S: Configuration + Default>(name: &'static str) -> Self {
        Self::new(name, FieldKind::OptionalStruct(StructType::of::<S>()))
    }

    pub fn embedded<S: Configuration + Default>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Embedded(StructType::of::<S>()))
    }

    pub fn description(mut self, text: &'static str) -> Self {
        self.description = Some(text);
        self
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    /// Use `name` instead of the field name as this field's flag segment.
    pub fn long(mut self, name: &'static str) -> Self {
        self.long = Some(name);
        self
    }

    /// Mark the field as not settable from outside its module.
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// The flag-path segment this field contributes (lowercased).
    pub fn segment(&self) -> String {
        self.long.unwrap_or(self.name).to_lowercase()
    }
}

pub(crate) fn to_table<C: Configuration>(config: &C) -> Result<Table, FlagError> {
    match serde_json::to_value(config) {
        Ok(Value::Object(table)) => Ok(table),
        Ok(other) => Err(FlagError::Encode(format!(
            "expected a table, found {}",
            value_kind(&other)
        ))),
        Err(e) => Err(FlagError::Encode(e.to_string())),
    }
}

pub(crate) fn from_table<C: Configuration>(table: Table) -> Result<C, FlagError> {
    serde_json::from_value(Value::Object(table)).map_err(|e| FlagError::Decode(e.to_string()))
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::DatabaseInfo;

    #[test]
    fn builder_sets_metadata() {
        let f = Field::leaf::<String>("log_level")
            .short('l')
            .description("Log level");
        assert_eq!(f.name, "log_level");
        assert_eq!(f.short, Some('l'));
        assert_eq!(f.description, Some("Log level"));
        assert!(f.exported);
        assert!(!f.kind.is_optional());
    }

    #[test]
    fn segment_prefers_long_and_lowercases() {
        assert_eq!(Field::leaf::<u32>("connection_max").long("CoMax").segment(), "comax");
        assert_eq!(Field::leaf::<u32>("LogLevel").segment(), "loglevel");
    }

    #[test]
    fn optional_kinds() {
        assert!(Field::optional::<String>("name").kind.is_optional());
        assert!(
            Field::optional_nested::<DatabaseInfo>("db")
                .kind
                .is_optional()
        );
        assert!(!Field::embedded::<DatabaseInfo>("base").kind.is_optional());
    }

    #[test]
    fn zero_values() {
        assert_eq!(
            Field::leaf::<String>("s").kind.zero(),
            Some(Value::String(String::new()))
        );
        assert_eq!(Field::leaf::<i64>("n").kind.zero(), Some(Value::from(0)));
        assert_eq!(
            Field::leaf::<Vec<String>>("list").kind.zero(),
            Some(Value::Array(vec![]))
        );
        let db = Field::nested::<DatabaseInfo>("db").kind.zero().unwrap();
        assert!(db.is_object());
    }

    #[test]
    fn optional_type_ids_name_the_wrapper() {
        let leaf = LeafType::of::<String>();
        assert_eq!(leaf.option_id, TypeId::of::<Option<String>>());
        assert_ne!(leaf.option_id, leaf.type_id);
        let nested = StructType::of::<DatabaseInfo>();
        assert_eq!(nested.option_id, TypeId::of::<Option<DatabaseInfo>>());
    }

    #[test]
    fn full_u64_range_survives_a_round_trip() {
        let db = DatabaseInfo {
            connection_max64: u64::MAX,
            ..DatabaseInfo::default()
        };
        let table = to_table(&db).unwrap();
        assert_eq!(table.get("connection_max64"), Some(&Value::from(u64::MAX)));
        let back: DatabaseInfo = from_table(table).unwrap();
        assert_eq!(back.connection_max64, u64::MAX);
    }

    #[test]
    fn private_marks_unexported() {
        assert!(!Field::leaf::<String>("other").private().exported);
    }
}
