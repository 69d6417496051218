//! Core load pipeline: materialize a typed config from defaults and flags.
//!
//! Operates on in-memory data only. Steps:
//!
//! 1. Discover the schema of `C` (fatal on a malformed type)
//! 2. Snapshot the defaults template
//! 3. Bind the arguments (best-effort, first error kept)
//! 4. Fill the target, even when binding failed
//! 5. Report the binding error, if any

use crate::args::{self, Bindings};
use crate::error::FlagError;
use crate::field::Configuration;
use crate::fill::fill;
use crate::parse::Registry;
use crate::schema::Schema;
use crate::snapshot::Snapshot;

/// What one load discovered, kept for diagnostics and help output.
#[derive(Debug)]
pub struct Loaded {
    pub schema: Schema,
    pub snapshot: Snapshot,
    pub bindings: Bindings,
    /// The first binding error. The target was still filled.
    pub error: Option<FlagError>,
}

impl Loaded {
    pub fn into_result(self) -> Result<(), FlagError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Run the pipeline, returning everything it built.
///
/// Only schema and encoding failures are returned as `Err`; binding errors
/// are carried in [`Loaded::error`].
pub fn resolve<C: Configuration>(
    target: &mut C,
    defaults: &C,
    args: &[String],
    registry: &Registry,
) -> Result<Loaded, FlagError> {
    // 1-2: Schema and snapshot
    let schema = Schema::of::<C>()?;
    let snapshot = Snapshot::build(&schema, defaults)?;

    // 3: Bind
    let (bindings, error) = args::bind(args, &schema, registry);

    // 4: Fill with whatever was bound
    fill(target, &schema, &snapshot, &bindings)?;

    Ok(Loaded {
        schema,
        snapshot,
        bindings,
        error,
    })
}

/// Materialize `target` from `defaults` and `args`.
///
/// On a binding error `target` still holds every value that could be bound
/// or defaulted, and the error is returned.
pub fn load<C: Configuration>(
    target: &mut C,
    defaults: &C,
    args: &[String],
    registry: &Registry,
) -> Result<(), FlagError> {
    resolve(target, defaults, args, registry)?.into_result()
}
