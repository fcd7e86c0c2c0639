use std::{
    fs::{self, File},
    io::{BufWriter, Write},
};

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::{
    batch::Summary,
    cli::Cli,
    config::Config,
    item::Document,
};

mod batch;
mod bibtex;
mod cli;
mod config;
mod error;
mod item;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let config = Config::load(args.config.as_deref())?;
    match &args.config {
        Some(path) => debug!("Config = {}", path.display()),
        None => debug!("Config = <bundled>"),
    }
    if config.fields.is_empty() {
        warn!("configuration defines no entry types");
    } else {
        debug!("{} entry types configured", config.fields.len());
    }

    let output = args.output_path();
    debug!("Input = {}", args.input.display());
    debug!("Output = {}", output.display());

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let document = Document::parse(&text)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut sink = BufWriter::new(file);
    let summary = batch::convert(document, &config.fields, args.optional_fields(), &mut sink)
        .and_then(|summary| sink.flush().map(|()| summary))
        .with_context(|| format!("failed to write {}", output.display()))?;

    report(&summary);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn report(summary: &Summary) {
    let written = format!("✓ {}", summary.written);
    let failed = format!("✗ {}", summary.failures.len());
    if std::env::var_os("NO_COLOR").is_some() {
        eprintln!("{written} {failed}");
    } else {
        eprintln!("{} {}", written.green(), failed.red());
    }
}
