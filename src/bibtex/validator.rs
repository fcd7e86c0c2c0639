use crate::{
    config::{FieldTable, Requirement},
    error::MissingField,
    item::BibItem,
};

/// Checks that `item` carries every field its type requires.
///
/// Types absent from `table` (and items without a type) have no requirements. Optional fields
/// are never checked.
pub fn validate(item: &BibItem, table: &FieldTable) -> Result<(), MissingField> {
    let entry_type = item.entry_type().unwrap_or_default();
    match table
        .required(entry_type)
        .iter()
        .find(|requirement| !requirement.is_met_by(item))
    {
        Some(Requirement::Field(name)) => Err(MissingField::Field(name.clone())),
        Some(Requirement::AnyOf(names)) => Err(MissingField::AnyOf(names.clone())),
        None => Ok(()),
    }
}
