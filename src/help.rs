//! Help text, laid out by clap.
//!
//! The schema is mirrored into a throwaway `clap::Command` purely for
//! rendering; clap never parses the arguments.

use clap::{Arg, ArgAction};

use crate::parse::Registry;
use crate::schema::{FlagKind, FlagMeta, Schema};
use crate::snapshot::Snapshot;

const TERM_WIDTH: usize = 100;

/// A visible sub-command as listed in its parent's help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: String,
    pub description: String,
}

/// Render help for one command.
pub fn render(
    name: &str,
    description: &str,
    schema: &Schema,
    snapshot: &Snapshot,
    registry: &Registry,
    subcommands: &[Listing],
) -> String {
    let mut cmd = clap::Command::new(name.to_string())
        .about(description.to_string())
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .term_width(TERM_WIDTH);

    for flag in schema.flags() {
        cmd = cmd.arg(flag_arg(flag, snapshot, registry));
    }

    if schema.flag("help").is_none() {
        let mut help = Arg::new("help")
            .long("help")
            .action(ArgAction::Help)
            .help("Print help");
        if schema.by_short('h').is_none() {
            help = help.short('h');
        }
        cmd = cmd.arg(help);
    }

    for sub in subcommands {
        cmd = cmd.subcommand(clap::Command::new(sub.name.clone()).about(sub.description.clone()));
    }

    cmd.render_help().to_string()
}

fn flag_arg(flag: &FlagMeta, snapshot: &Snapshot, registry: &Registry) -> Arg {
    let mut arg = Arg::new(flag.path.clone())
        .long(flag.path.clone())
        .help(flag.description.clone());
    if let Some(c) = flag.short {
        arg = arg.short(c);
    }
    // Switches stand alone or take `=BOOL`. An optional whose `Option` type
    // has a parser takes `=VALUE` instead.
    if flag.is_switch() {
        let name = if flag.kind == FlagKind::Toggle && registry.contains(flag.type_id) {
            value_name(flag.type_name)
        } else {
            "BOOL".to_string()
        };
        return arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .value_name(name);
    }

    arg = arg
        .action(ArgAction::Set)
        .value_name(value_name(flag.type_name));
    let default = snapshot
        .get(&flag.path)
        .and_then(|value| registry.render(flag.type_id, value))
        .filter(|text| !text.is_empty());
    match default {
        Some(text) => arg.default_value(text),
        None => arg,
    }
}

/// `alloc::string::String` → `STRING`, `Vec<my::Server>` → `VEC`,
/// `Option<String>` → `STRING`.
fn value_name(type_name: &str) -> String {
    let type_name = type_name
        .strip_prefix("core::option::Option<")
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(type_name);
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).to_uppercase()
}
