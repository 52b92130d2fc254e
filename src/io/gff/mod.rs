//! GFF3 input and output.
//!
//! [`Tokenizer`] splits text into classified lines, [`GraphBuilder`] turns
//! them into a [`Document`] and [`serialize`] renders a document back to
//! canonical text.

mod builder;
mod tokenizer;
mod write;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
pub use builder::{
    parse,
    parse_reader,
    parse_with,
    GraphBuilder,
    ParseOptions,
};
use log::info;
use rayon::prelude::*;
pub use tokenizer::{
    Directive,
    GffLine,
    Token,
    Tokenizer,
    GFF_VERSION,
};
pub use write::{
    serialize,
    GffWriter,
    GFF_VERSION_LINE,
};

use crate::data_structs::annotation::Document;

/// Reads one GFF3 file.
pub fn read_gff_file<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> anyhow::Result<Document> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open GFF3 file {}", path.display()))?;
    let doc = parse_reader(BufReader::new(file), options)
        .with_context(|| format!("Failed to parse GFF3 file {}", path.display()))?;
    if !doc.warnings().is_empty() {
        info!(
            "{} relation(s) dropped while reading {}",
            doc.warnings().len(),
            path.display()
        );
    }
    Ok(doc)
}

/// Reads several GFF3 files in parallel. Every document is built
/// independently; the first failing file fails the whole call.
pub fn read_many<P>(
    paths: &[P],
    options: &ParseOptions,
) -> anyhow::Result<Vec<Document>>
where
    P: AsRef<Path> + Sync, {
    info!("Reading {} GFF3 files", paths.len());
    paths
        .par_iter()
        .map(|path| read_gff_file(path, options))
        .collect()
}
