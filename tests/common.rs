#![allow(dead_code)]
use std::path::PathBuf;

use gffxplorer::prelude::*;

pub const STANDARD_GENE: &str = "standard_gene_as_tree.gff3";

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn read_data(name: &str) -> String {
    std::fs::read_to_string(data_path(name)).expect("test data file is readable")
}

pub fn load(name: &str) -> Document {
    parse(&read_data(name)).expect("test data file parses")
}

/// IDs of the top-level features, pseudo-features show up as `None`.
pub fn root_ids(doc: &Document) -> Vec<Option<String>> {
    doc.roots()
        .iter()
        .map(|root| doc.node(*root).id().map(str::to_owned))
        .collect()
}
