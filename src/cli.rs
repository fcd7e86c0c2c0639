use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::Parser;

use crate::bibtex::OptionalFields;

#[derive(Parser, Debug)]
#[command(version, about = "Translate a bibliography from YAML to BibTeX", long_about = None)]
pub struct Cli {
    /// Input YAML file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Output BibTeX file [default: the input's file name with a .bib extension]
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
    /// Field requirements per entry type [default: the bundled table]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
    /// Emit optional fields only once instead of repeating them after the remaining fields
    #[arg(long)]
    pub dedup_optional: bool,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output(&self.input))
    }

    pub fn optional_fields(&self) -> OptionalFields {
        if self.dedup_optional {
            OptionalFields::Dedup
        } else {
            OptionalFields::Repeat
        }
    }
}

/// The input's file name, without directory and last extension, with `.bib` appended.
///
/// The result is relative, so it lands in the current directory.
pub fn default_output(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("bibliography"));
    name.push(".bib");
    PathBuf::from(name)
}
