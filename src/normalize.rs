//! Strip every optional field from a configuration value.

use serde_json::Value;

use crate::error::FlagError;
use crate::field::{Configuration, Field, FieldKind, Table, from_table, to_table};

/// An independent copy of `config` with every `Option` field, at any depth,
/// set to `None`. `config` itself is untouched.
///
/// Fields without a description are stripped too: this works on the declared
/// fields, not on the flag schema.
pub fn without_optionals<C: Configuration>(config: &C) -> Result<C, FlagError> {
    let mut table = to_table(config)?;
    strip(&mut table, C::fields());
    from_table(table)
}

fn strip(table: &mut Table, fields: Vec<Field>) {
    for field in fields {
        match field.kind {
            FieldKind::Optional(_) | FieldKind::OptionalStruct(_) => {
                table.remove(field.name);
            }
            FieldKind::Struct(s) | FieldKind::Embedded(s) => {
                if let Some(Value::Object(inner)) = table.get_mut(field.name) {
                    strip(inner, s.fields());
                }
            }
            FieldKind::Leaf(_) => {}
        }
    }
}
