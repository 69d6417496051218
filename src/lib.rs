//! Materialize typed, nested configuration structs from a defaults template
//! and command-line flags. Describe your struct once, and go.
//!
//! ```ignore
//! let config: Settings = Flagtree::loader()
//!     .args(std::env::args().skip(1))
//!     .load(&Settings::defaults())?;
//! ```
//!
//! That single call derives one flag per described field (`--log_level`,
//! `--retries.level`, ...), binds the arguments, and fills a fresh `Settings`
//! with bound values, falling back to the defaults template and then to zero
//! values.
//!
//! # Describing a configuration
//!
//! A configuration type is any serde struct that implements
//! [`Configuration`] by listing its fields as [`Field`] descriptors:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize, Default)]
//! struct Settings {
//!     name: String,
//!     log_level: String,
//!     retries: Option<Retry>,
//! }
//!
//! impl Configuration for Settings {
//!     fn fields() -> Vec<Field> {
//!         vec![
//!             Field::leaf::<String>("name"),
//!             Field::leaf::<String>("log_level").short('l').description("Log level"),
//!             Field::optional_nested::<Retry>("retries").description("Enable retries"),
//!         ]
//!     }
//! }
//! ```
//!
//! - **Described fields** become flags. Fields without a description are not
//!   flags and keep whatever value the target already holds.
//! - **Nested structs** extend the flag-path: `retries.level`.
//! - **Embedded structs** ([`Field::embedded`]) are flattened: their fields
//!   appear under the parent's path.
//! - **`Option` fields** are optional: they get their own toggle flag
//!   (`--retries`) and are only materialized when activated.
//!
//! Flag-paths are the lowercase dot-join of field names (or of the names set
//! with [`Field::long`]) and are matched case-insensitively.
//!
//! # Precedence
//!
//! ```text
//! Zero value            T::default()
//!        ↑ overridden by
//! Defaults template     the value passed to load()
//!        ↑ overridden by
//! Bound flags           --path=value
//! ```
//!
//! # Activation
//!
//! An optional field is present in the result if and only if its own flag
//! or a flag below it was given. Default data alone never creates one:
//!
//! | Defaults `retries` | Arguments              | Result `retries`        |
//! |--------------------|------------------------|-------------------------|
//! | `None`             | `--loglevel=WARN`      | `None`                  |
//! | `Some{level: 5}`   | (none)                 | `None`                  |
//! | `Some{level: 5}`   | `--retries`            | `Some{level: 5}`        |
//! | `Some{level: 5}`   | `--retries.level=9`    | `Some{level: 9}`        |
//!
//! `--retries=false` explicitly leaves the field off unless a child flag is
//! also given. An optional leaf's own flag is a boolean too: `--owner.name`
//! surfaces the default and `--owner.name=false` leaves it unset. To take a
//! value instead, register a parser for the `Option` type itself:
//!
//! ```ignore
//! Flagtree::loader::<Settings>().parser::<Option<String>>(NameParser::default())
//! ```
//!
//! # Flag syntax
//!
//! `--name`, `--name=value`, `--name value`, `-x`, `-xvalue`, `-x value`,
//! `-x=value` and clustered switches `-wv`. Boolean fields never consume the
//! next token. `--` ends flag parsing; everything after it, and any bare
//! token, is positional.
//!
//! # Parsers
//!
//! Leaf values are parsed by the [`Registry`]. It ships with parsers for
//! `bool`, every integer type, `f32`/`f64`, `String`, `char`, [`Duration`]
//! (`9ms`, `1h30m`) and [`Timestamp`] (RFC 3339). Register a [`Parser`] for
//! anything else, such as lists:
//!
//! ```ignore
//! Flagtree::loader::<Settings>()
//!     .parser::<Vec<Server>>(ServerListParser::default())
//! ```
//!
//! Each flag gets its own parser instance, so repeating a flag feeds the
//! same instance again: list parsers accumulate, scalar parsers keep the
//! last value.
//!
//! # Error handling
//!
//! All fallible operations return [`FlagError`]. Errors in the type
//! description (a private described field, colliding flag-paths) abort the
//! load before anything is bound. Binding errors (bad values, missing
//! parsers, unknown flags) do not: the target is still filled with
//! everything that could be bound, and the first error is returned.
//! [`FlagError::is_binding`] tells the two apart.
//!
//! # Commands
//!
//! With the `clap` feature (on by default), [`App`] dispatches to a root
//! [`Command`] or a named sub-command, renders help through clap, and runs
//! the selected command with its materialized configuration.
//!
//! ```toml
//! flagtree = { version = "...", default-features = false }
//! ```
//!
//! drops the dispatch layer and the clap dependency.

pub mod error;
pub mod types;

mod args;
mod builder;
mod field;
mod fill;
mod normalize;
mod parse;
mod resolve;
mod schema;
mod snapshot;

#[cfg(feature = "clap")]
mod app;
#[cfg(feature = "clap")]
mod help;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use app::{App, Command};
pub use args::{Bindings, Bound, bind, normalize_arg, normalize_args, split_args};
pub use builder::{Flagtree, Loader};
pub use error::FlagError;
pub use field::{Configuration, Field, FieldKind, LeafType, StructType};
pub use fill::fill;
pub use normalize::without_optionals;
pub use parse::{BoolParser, FromStrParser, Parser, Registry};
pub use resolve::{Loaded, load, resolve};
pub use schema::{FlagKind, FlagMeta, Node, NodeKind, Schema};
pub use snapshot::Snapshot;
pub use types::{Duration, Timestamp};
