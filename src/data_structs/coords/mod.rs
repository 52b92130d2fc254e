//! Genomic coordinates.
//!
//! - [`Range`]: a 1-based closed interval, the unit every GFF3 coordinate is
//!   expressed in.
//! - [`Contig`]: a range on a named sequence with a strand.

mod contig;
mod range;

pub use contig::Contig;
pub use range::Range;

#[cfg(test)]
mod tests;
