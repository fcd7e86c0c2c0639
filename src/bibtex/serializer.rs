use std::fmt::Write;

use tracing::info;

use crate::{
    bibtex::validator::validate,
    config::FieldTable,
    error::{ConversionError, MissingField},
    item::{BibItem, EXTRACTED_FIELDS, FieldValue},
};

/// How the optional fields of a type are emitted after the remaining fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionalFields {
    /// Emit every present optional field again, even though it already appeared among the
    /// remaining fields.
    #[default]
    Repeat,
    /// Emit each field once.
    Dedup,
}

/// Renders `item` as a BibTeX entry under `key`.
///
/// The entry is built in full before it is returned, so a failing item produces no text at all.
pub fn serialize_entry(
    key: &str,
    item: &BibItem,
    table: &FieldTable,
    optional: OptionalFields,
) -> Result<String, ConversionError> {
    let entry_type = item.entry_type().ok_or(MissingField::Type)?;
    let mut out = String::new();
    out.push_str(table.identifier(entry_type));
    out.push('{');

    let authors = item.authors().ok_or(MissingField::Author)?;
    if !item.contains("year") {
        return Err(MissingField::Year.into());
    }
    validate(item, table)?;

    info!("Writing: {key}");
    let _ = write!(out, "{key} ,\n  author = {{{authors}}},\n");

    for (name, value) in item.remaining() {
        push_field(&mut out, name, value);
    }

    if optional == OptionalFields::Repeat {
        for name in table.optional(entry_type) {
            if EXTRACTED_FIELDS.contains(&name.as_str()) {
                continue;
            }
            if let Some(value) = item.get(name) {
                push_field(&mut out, name, value);
            }
        }
    }

    out.push_str("}\n\n");
    Ok(out)
}

fn push_field(out: &mut String, name: &str, value: &FieldValue) {
    let _ = writeln!(out, "  {name} = {{{value}}},");
}
