use std::{collections::HashSet, io};

use tracing::{error, info, warn};

use crate::{
    bibtex::{OptionalFields, serialize_entry},
    config::FieldTable,
    error::ConversionError,
    item::{BibItem, Document, Node},
};

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct Summary {
    pub written: usize,
    pub failures: Vec<(String, ConversionError)>,
}

/// Converts every entry of `document` and writes the successful ones to `sink`, in order.
///
/// A [`ConversionError`] only costs the item that raised it: it is logged, recorded in the
/// summary, and the run moves on. Failures to write to `sink` end the run.
pub fn convert<W: io::Write>(
    document: Document,
    table: &FieldTable,
    optional: OptionalFields,
    sink: &mut W,
) -> io::Result<Summary> {
    if document.is_empty() {
        warn!("input contains no entries");
    }

    let mut seen = HashSet::with_capacity(document.len());
    let mut summary = Summary::default();
    for (key, raw) in document.into_entries() {
        match process(&mut seen, &key, raw, table, optional) {
            Ok(entry) => {
                sink.write_all(entry.as_bytes())?;
                summary.written += 1;
            }
            Err(err) => {
                error!("*** Error while processing an item: {err}");
                summary.failures.push((key, err));
            }
        }
    }
    Ok(summary)
}

fn process(
    seen: &mut HashSet<String>,
    key: &str,
    raw: Node,
    table: &FieldTable,
    optional: OptionalFields,
) -> Result<String, ConversionError> {
    if seen.contains(key) {
        return Err(ConversionError::DuplicateKey(key.to_string()));
    }
    seen.insert(key.to_string());

    info!("Processing {key}");
    let item = BibItem::try_from(raw)?;
    serialize_entry(key, &item, table, optional)
}
