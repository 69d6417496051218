use std::marker::PhantomData;

use crate::error::FlagError;
use crate::field::Configuration;
use crate::normalize::without_optionals;
use crate::parse::{Parser, Registry};
use crate::resolve::{self, Loaded};

/// Entry point for building a flagtree loader.
pub struct Flagtree;

impl Flagtree {
    pub fn loader<C: Configuration>() -> Loader<C> {
        Loader::new()
    }
}

/// Builder for materializing one configuration type from flags.
///
/// ```ignore
/// let config: Settings = Flagtree::loader()
///     .parser::<Vec<Server>>(ServerListParser::default())
///     .args(std::env::args().skip(1))
///     .load(&Settings::defaults())?;
/// ```
pub struct Loader<C: Configuration> {
    registry: Registry,
    args: Vec<String>,
    _phantom: PhantomData<C>,
}

impl<C: Configuration> Loader<C> {
    fn new() -> Self {
        Self {
            registry: Registry::default(),
            args: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Register a parser for fields of type `T`, replacing any built-in one.
    pub fn parser<T: 'static>(mut self, parser: impl Parser + 'static) -> Self {
        self.registry.register::<T>(parser);
        self
    }

    /// Replace the whole parser registry.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Append command-line arguments (without the program name).
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Load into an existing target. On a binding error the target is still
    /// filled as far as possible.
    pub fn load_into(&self, target: &mut C, defaults: &C) -> Result<(), FlagError> {
        resolve::load(target, defaults, &self.args, &self.registry)
    }

    /// Like [`load_into`](Self::load_into), returning what the load
    /// discovered instead of just the first error.
    pub fn resolve_into(&self, target: &mut C, defaults: &C) -> Result<Loaded, FlagError> {
        resolve::resolve(target, defaults, &self.args, &self.registry)
    }

    /// Load a fresh value. The target starts as `defaults` with every
    /// optional field cleared.
    pub fn load(&self, defaults: &C) -> Result<C, FlagError> {
        let mut target = without_optionals(defaults)?;
        self.load_into(&mut target, defaults)?;
        Ok(target)
    }
}
