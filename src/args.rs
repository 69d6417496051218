//! Argument binding: resolve command-line tokens against the schema and feed
//! each value to a per-flag parser.
//!
//! Binding is best-effort. Bad values and missing parsers are recorded and
//! the pass continues; an unknown flag (or an undeclared `--help`) stops it.
//! In every case the caller gets back what was bound so far together with
//! the first error.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::FlagError;
use crate::parse::{BoolParser, Parser, Registry};
use crate::schema::{FlagKind, FlagMeta, Schema};

/// A flag's value as supplied on the command line.
#[derive(Debug)]
pub enum Bound {
    /// An optional field switched on (or explicitly off with `--db=false`).
    Toggle(bool),
    /// A parsed value. For an optional field this is the output of a parser
    /// registered for the `Option` type, replacing the whole value.
    Value(Box<dyn Parser>),
}

impl Bound {
    /// Whether this binding activates the field at its own path.
    pub fn is_active(&self) -> bool {
        match self {
            Bound::Toggle(on) => *on,
            Bound::Value(_) => true,
        }
    }

    pub fn value(&self) -> Option<Value> {
        match self {
            Bound::Value(parser) => Some(parser.get()),
            Bound::Toggle(_) => None,
        }
    }
}

/// Flags bound for one load, keyed by flag-path.
#[derive(Debug, Default)]
pub struct Bindings {
    values: BTreeMap<String, Bound>,
    positional: Vec<String>,
}

impl Bindings {
    pub fn get(&self, path: &str) -> Option<&Bound> {
        self.values.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// Whether any flag strictly below `path` was bound.
    pub fn has_descendant(&self, path: &str) -> bool {
        let prefix = format!("{path}.");
        self.values
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Non-flag tokens and everything after `--`.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Lowercase the flag name of a token, leaving any value untouched.
///
/// Leading whitespace is dropped. `--Name=Val` becomes `--name=Val`, `-UVal`
/// becomes `-uVal`; `-`, `--` and non-flag tokens are returned as is.
pub fn normalize_arg(arg: &str) -> String {
    let arg = arg.trim_start();
    if arg == "-" || arg == "--" || !arg.starts_with('-') {
        return arg.to_string();
    }
    if let Some(long) = arg.strip_prefix("--") {
        return match long.split_once('=') {
            Some((name, value)) => format!("--{}={value}", name.to_lowercase()),
            None => format!("--{}", long.to_lowercase()),
        };
    }
    let mut chars = arg[1..].chars();
    match chars.next() {
        Some(c) => format!("-{}{}", c.to_lowercase(), chars.as_str()),
        None => arg.to_string(),
    }
}

pub fn normalize_args(args: &[String]) -> Vec<String> {
    args.iter().map(|a| normalize_arg(a)).collect()
}

/// Split a command selector off the front of `args`.
///
/// A leading flag (or empty token) means the root command `""`, and every
/// token belongs to it.
pub fn split_args(args: &[String]) -> (String, Vec<String>) {
    match args.split_first() {
        None => (String::new(), Vec::new()),
        Some((first, _)) if first.is_empty() || first.starts_with('-') => {
            (String::new(), args.to_vec())
        }
        Some((first, rest)) => (first.clone(), rest.to_vec()),
    }
}

/// Bind `args` against `schema`.
///
/// Returns the bindings made and the first error met, if any.
pub fn bind(args: &[String], schema: &Schema, registry: &Registry) -> (Bindings, Option<FlagError>) {
    let mut binder = Binder {
        schema,
        registry,
        bindings: Bindings::default(),
        error: None,
    };
    binder.run(args);
    log::debug!(
        "bound {} flags, {} positional",
        binder.bindings.len(),
        binder.bindings.positional.len()
    );
    (binder.bindings, binder.error)
}

enum Step {
    Continue,
    Stop,
}

struct Binder<'a> {
    schema: &'a Schema,
    registry: &'a Registry,
    bindings: Bindings,
    error: Option<FlagError>,
}

impl Binder<'_> {
    fn run(&mut self, args: &[String]) {
        let mut tokens = args.iter();
        while let Some(raw) = tokens.next() {
            let arg = normalize_arg(raw);
            if arg == "--" {
                self.bindings.positional.extend(tokens.cloned());
                return;
            }
            if arg == "-" || !arg.starts_with('-') {
                self.bindings.positional.push(arg);
                continue;
            }
            let step = match arg.strip_prefix("--") {
                Some(long) => self.long(long, &mut tokens),
                None => self.short(&arg[1..], &mut tokens),
            };
            if let Step::Stop = step {
                return;
            }
        }
    }

    fn long<'t>(&mut self, body: &str, rest: &mut impl Iterator<Item = &'t String>) -> Step {
        let (name, attached) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (body, None),
        };
        let schema = self.schema;
        let Some(meta) = schema.flag(name) else {
            return self.undeclared(name == "help", format!("--{name}"));
        };
        let value = match attached {
            Some(value) => Some(value),
            None if meta.is_switch() => None,
            None => match rest.next() {
                Some(next) => Some(next.clone()),
                None => {
                    self.needs_argument(meta);
                    return Step::Continue;
                }
            },
        };
        self.apply(meta, value);
        Step::Continue
    }

    /// A run of short flags: `-l WARN`, `-lWARN`, `-l=WARN`, or clustered
    /// switches like `-wv`.
    fn short<'t>(&mut self, body: &str, rest: &mut impl Iterator<Item = &'t String>) -> Step {
        let schema = self.schema;
        for (i, c) in body.char_indices() {
            let Some(meta) = schema.by_short(c) else {
                return self.undeclared(c == 'h', format!("-{c}"));
            };
            let tail = &body[i + c.len_utf8()..];
            if meta.is_switch() {
                if let Some(value) = tail.strip_prefix('=') {
                    self.apply(meta, Some(value.to_string()));
                    return Step::Continue;
                }
                self.apply(meta, None);
                continue;
            }
            let value = if tail.is_empty() {
                match rest.next() {
                    Some(next) => next.clone(),
                    None => {
                        self.needs_argument(meta);
                        return Step::Continue;
                    }
                }
            } else {
                tail.strip_prefix('=').unwrap_or(tail).to_string()
            };
            self.apply(meta, Some(value));
            return Step::Continue;
        }
        Step::Continue
    }

    fn undeclared(&mut self, is_help: bool, flag: String) -> Step {
        let error = if is_help {
            FlagError::HelpRequested
        } else {
            FlagError::UnknownFlag { flag }
        };
        self.record(error);
        Step::Stop
    }

    fn needs_argument(&mut self, meta: &FlagMeta) {
        self.record(FlagError::InvalidArgument {
            flag: meta.path.clone(),
            value: String::new(),
            reason: "flag needs an argument".into(),
        });
    }

    fn apply(&mut self, meta: &FlagMeta, value: Option<String>) {
        if let Err(e) = self.bind_one(meta, value) {
            self.record(e);
        }
    }

    fn bind_one(&mut self, meta: &FlagMeta, value: Option<String>) -> Result<(), FlagError> {
        match (meta.kind, value) {
            (FlagKind::Value, value) => {
                let text = value.unwrap_or_else(|| "true".to_string());
                self.feed(meta, &text)
            }
            (FlagKind::Toggle, None) => {
                let slot = self.bindings.values.entry(meta.path.clone());
                let bound = slot.or_insert(Bound::Toggle(true));
                if let Bound::Toggle(on) = bound {
                    *on = true;
                }
                log::trace!("toggled {}", meta.path);
                Ok(())
            }
            // Only a parser for the `Option` type itself takes over the
            // attached text; otherwise it is a boolean.
            (FlagKind::Toggle, Some(text)) if self.registry.contains(meta.type_id) => {
                self.feed(meta, &text)
            }
            (FlagKind::Toggle, Some(text)) => {
                let on = BoolParser::parse(&text).map_err(|reason| invalid(meta, &text, reason))?;
                self.bindings
                    .values
                    .insert(meta.path.clone(), Bound::Toggle(on));
                Ok(())
            }
        }
    }

    /// Feed `text` to the flag's own parser, creating it on first use.
    fn feed(&mut self, meta: &FlagMeta, text: &str) -> Result<(), FlagError> {
        if let Some(Bound::Value(parser)) = self.bindings.values.get_mut(&meta.path) {
            return parser.set(text).map_err(|reason| invalid(meta, text, reason));
        }
        let mut parser =
            self.registry
                .instantiate(meta.type_id)
                .ok_or_else(|| FlagError::ParserNotFound {
                    flag: meta.path.clone(),
                    type_name: meta.type_name.to_string(),
                })?;
        parser.set(text).map_err(|reason| invalid(meta, text, reason))?;
        log::trace!("bound {} = {text:?}", meta.path);
        self.bindings
            .values
            .insert(meta.path.clone(), Bound::Value(parser));
        Ok(())
    }

    fn record(&mut self, error: FlagError) {
        log::debug!("binding error: {error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

fn invalid(meta: &FlagMeta, value: &str, reason: String) -> FlagError {
    FlagError::InvalidArgument {
        flag: meta.path.clone(),
        value: value.to_string(),
        reason,
    }
}
