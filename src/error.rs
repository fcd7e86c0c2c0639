use thiserror::Error;

/// Everything that can go wrong while converting a single item.
///
/// None of these abort a batch: the driver logs them and moves on to the next item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("{}", MissingField::describe(.0))]
    MissingField(MissingField),
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Unsupported value for '{field}': {found}")]
    UnsupportedValue { field: String, found: &'static str },
}

/// Which field (or set of alternatives) an item was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingField {
    Type,
    Author,
    Year,
    Field(String),
    AnyOf(Vec<String>),
}

impl MissingField {
    fn describe(&self) -> String {
        match self {
            MissingField::Type => "Missing type".to_string(),
            MissingField::Author => "Missing author".to_string(),
            MissingField::Year => "Missing year".to_string(),
            MissingField::Field(name) => format!("Missing required field: '{name}'"),
            MissingField::AnyOf(names) => format!("Missing required field: {}", names.join(" or ")),
        }
    }
}

impl From<MissingField> for ConversionError {
    fn from(missing: MissingField) -> Self {
        ConversionError::MissingField(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_log_format() {
        let cases = [
            (ConversionError::from(MissingField::Type), "Missing type"),
            (ConversionError::from(MissingField::Author), "Missing author"),
            (ConversionError::from(MissingField::Year), "Missing year"),
            (
                MissingField::Field("publisher".into()).into(),
                "Missing required field: 'publisher'",
            ),
            (
                MissingField::AnyOf(vec!["author".into(), "authors".into()]).into(),
                "Missing required field: author or authors",
            ),
            (
                ConversionError::DuplicateKey("knuth84".into()),
                "Duplicate key: knuth84",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
