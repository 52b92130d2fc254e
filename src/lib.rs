//! # gffxplorer
//!
//! `gffxplorer` reads, checks, transforms and writes GFF3 genome annotations.
//! Feature lines are tokenized in a single forward pass and assembled into a
//! feature graph: features sharing an `ID` become one multi-location node,
//! `Parent` attributes become edges (a feature may have several parents) and
//! disconnected top-level features belonging together are grouped under a
//! pseudo-feature.
//!
//! ## Key Features
//!
//! * **Strict and tidy parsing**: every problem is reported with the line it
//!   occurred on. Tidy mode turns reference problems (undefined parents,
//!   IDs reused across `###`) into warnings, see [`ParseOptions`].
//! * **Validation**: sequence-region containment, attribute shape, feature
//!   types against a sequence ontology ([`Ontology`]) and sortedness.
//! * **OBO ontologies**: [`io::obo`] reads stanza based ontology files; a
//!   sequence ontology subset is built in.
//! * **Transformations**: [`sort`], [`filter`], [`transform_offset`],
//!   [`tools::merge_features`], [`tools::add_introns`] and [`tools::merge`].
//!   Each one consumes a [`Document`] and returns a new one.
//! * **Canonical output**: [`serialize`] writes stable attribute order,
//!   consistent escaping and optionally wrapped FASTA sequences.
//! * **Parallel processing**: [`read_many`] and [`tools::validate_many`]
//!   handle independent files with Rayon.
//!
//! ## Structure
//!
//! * [`data_structs`]: coordinates ([`Range`], [`Contig`]), feature records,
//!   the [`Document`] arena and the ontology term table.
//! * [`io`]: GFF3 tokenizer, graph builder and writer, and the OBO reader.
//! * [`tools`]: whole-document operations.
//! * [`error`]: line-numbered [`Diagnostic`]s.
//!
//! ## Usage
//!
//! ```no_run
//! use gffxplorer::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let doc = read_gff_file("annotation.gff3", &ParseOptions::default())?;
//!     validate(&doc, &ValidateOptions::new().with_type_check(TypeCheck::BuiltIn))?;
//!
//!     let options = FilterOptions::new().with_min_gene_score(Some(0.6));
//!     let doc = filter(sort(doc), &options);
//!     print!("{}", serialize(&doc, 60));
//!     Ok(())
//! }
//! ```

pub mod data_structs;
pub mod error;
pub mod io;
pub mod prelude;
pub mod tools;
pub mod utils;

#[allow(unused_imports)]
use prelude::*;
