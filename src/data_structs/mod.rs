//! This module contains the core data structures of the `gffxplorer` crate.
//!
//! Key components of this module include:
//!
//! - [`annotation`]: feature records, their attributes and the [`Document`]
//!   arena holding the feature graph together with sequence regions,
//!   comments and embedded sequences.
//! - [`coords`]: [`Range`] for 1-based closed intervals and [`Contig`] for
//!   located intervals.
//! - [`ontology`]: the term table used to check feature types.
//! - [`Strand`], the column 7 enumeration.
//!
//! [`Document`]: annotation::Document
//! [`Range`]: coords::Range
//! [`Contig`]: coords::Contig

pub mod annotation;
pub mod coords;
mod enums;
pub mod ontology;

pub use enums::{
    Strand,
    StrandParseError,
    STRAND_CHARS,
};
