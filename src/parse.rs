//! Parsers turn flag text into typed values, and the [`Registry`] maps each
//! leaf type to the parser that handles it.
//!
//! One parser instance per type lives in the registry. The binder never
//! writes to it: every bound flag gets its own copy via [`Parser::boxed`].

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::field::value_kind;
use crate::types::{Duration, Timestamp};

/// A value holder for one flag.
///
/// `set` consumes command-line text, `get` exposes the current value in the
/// engine's dynamic representation, `render` formats it for help output and
/// `set_value` overwrites it from a dynamic value (used to show defaults).
pub trait Parser: fmt::Debug {
    fn set(&mut self, text: &str) -> Result<(), String>;
    fn get(&self) -> Value;
    fn render(&self) -> String;
    fn set_value(&mut self, value: Value) -> Result<(), String>;
    fn boxed(&self) -> Box<dyn Parser>;
}

/// Parser for any type with `FromStr`/`Display` that serializes to a single
/// scalar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FromStrParser<T> {
    value: T,
}

impl<T> FromStrParser<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Parser for FromStrParser<T>
where
    T: FromStr + fmt::Display + fmt::Debug + Clone + Serialize + DeserializeOwned + 'static,
    T::Err: fmt::Display,
{
    fn set(&mut self, text: &str) -> Result<(), String> {
        let parsed: T = text.parse().map_err(|e: T::Err| e.to_string())?;
        // Non-finite floats have no dynamic form and could not be filled back.
        if let Ok(Value::Null) | Err(_) = serde_json::to_value(&parsed) {
            return Err(format!("{text:?} cannot be represented"));
        }
        self.value = parsed;
        Ok(())
    }

    fn get(&self) -> Value {
        serde_json::to_value(&self.value).unwrap_or_else(|_| Value::String(self.value.to_string()))
    }

    fn render(&self) -> String {
        self.value.to_string()
    }

    fn set_value(&mut self, value: Value) -> Result<(), String> {
        self.value = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn boxed(&self) -> Box<dyn Parser> {
        Box::new(self.clone())
    }
}

/// Boolean parser accepting the usual spellings: `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolParser(pub bool);

impl BoolParser {
    pub fn parse(text: &str) -> Result<bool, String> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(format!("{text:?} is not a boolean")),
        }
    }
}

impl Parser for BoolParser {
    fn set(&mut self, text: &str) -> Result<(), String> {
        self.0 = Self::parse(text)?;
        Ok(())
    }

    fn get(&self) -> Value {
        Value::Bool(self.0)
    }

    fn render(&self) -> String {
        self.0.to_string()
    }

    fn set_value(&mut self, value: Value) -> Result<(), String> {
        match value {
            Value::Bool(b) => {
                self.0 = b;
                Ok(())
            }
            other => Err(format!("expected a boolean, found {}", value_kind(&other))),
        }
    }

    fn boxed(&self) -> Box<dyn Parser> {
        Box::new(*self)
    }
}

struct Entry {
    type_name: &'static str,
    parser: Box<dyn Parser>,
}

/// Type-keyed parser table.
///
/// Populate it before loading; loads only read from it.
pub struct Registry {
    parsers: HashMap<TypeId, Entry>,
}

impl Registry {
    /// A registry with no parsers at all, not even the built-in ones.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register (or replace) the parser used for fields of type `T`.
    pub fn register<T: 'static>(&mut self, parser: impl Parser + 'static) -> &mut Self {
        log::trace!("registering parser for {}", type_name::<T>());
        self.parsers.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: type_name::<T>(),
                parser: Box::new(parser),
            },
        );
        self
    }

    pub fn with<T: 'static>(mut self, parser: impl Parser + 'static) -> Self {
        self.register::<T>(parser);
        self
    }

    pub fn get(&self, type_id: TypeId) -> Option<&dyn Parser> {
        self.parsers.get(&type_id).map(|entry| entry.parser.as_ref())
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.parsers.contains_key(&type_id)
    }

    /// A fresh parser for `type_id`, independent of every other flag.
    pub fn instantiate(&self, type_id: TypeId) -> Option<Box<dyn Parser>> {
        self.get(type_id).map(|parser| parser.boxed())
    }

    /// Render a dynamic value the way the parser for `type_id` would print it.
    pub fn render(&self, type_id: TypeId, value: &Value) -> Option<String> {
        let mut parser = self.instantiate(type_id)?;
        parser.set_value(value.clone()).ok()?;
        Some(parser.render())
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.parsers.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for Registry {
    /// Primitives, [`Duration`] and [`Timestamp`].
    fn default() -> Self {
        Registry::empty()
            .with::<bool>(BoolParser::default())
            .with::<i8>(FromStrParser::<i8>::default())
            .with::<i16>(FromStrParser::<i16>::default())
            .with::<i32>(FromStrParser::<i32>::default())
            .with::<i64>(FromStrParser::<i64>::default())
            .with::<isize>(FromStrParser::<isize>::default())
            .with::<u8>(FromStrParser::<u8>::default())
            .with::<u16>(FromStrParser::<u16>::default())
            .with::<u32>(FromStrParser::<u32>::default())
            .with::<u64>(FromStrParser::<u64>::default())
            .with::<usize>(FromStrParser::<usize>::default())
            .with::<f32>(FromStrParser::<f32>::default())
            .with::<f64>(FromStrParser::<f64>::default())
            .with::<String>(FromStrParser::<String>::default())
            .with::<char>(FromStrParser::<char>::default())
            .with::<Duration>(FromStrParser::<Duration>::default())
            .with::<Timestamp>(FromStrParser::<Timestamp>::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .finish()
    }
}
