use std::fmt::Display;

use arcstr::ArcStr;
use serde::{
    Deserialize,
    Serialize,
};

use super::Range;
use crate::data_structs::enums::Strand;

/// Represents a located interval: a sequence name, a 1-based closed range and
/// a strand. Used both for feature locations and for `Target` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contig {
    seqname: ArcStr,
    range:   Range,
    strand:  Strand,
}

impl Contig {
    /// Creates a new `Contig`.
    pub fn new<S: Into<ArcStr>>(
        seqname: S,
        start: u64,
        end: u64,
        strand: Strand,
    ) -> Self {
        Self {
            seqname: seqname.into(),
            range: Range::new(start, end),
            strand,
        }
    }

    /// Returns the sequence name.
    pub fn seqname(&self) -> &ArcStr { &self.seqname }

    pub fn start(&self) -> u64 { self.range.start() }

    pub fn end(&self) -> u64 { self.range.end() }

    pub fn range(&self) -> Range { self.range }

    pub fn strand(&self) -> Strand { self.strand }

    /// Returns the number of covered positions.
    pub fn length(&self) -> u64 { self.range.length() }

    pub fn set_seqname<S: Into<ArcStr>>(
        &mut self,
        seqname: S,
    ) {
        self.seqname = seqname.into();
    }

    pub fn set_start(
        &mut self,
        start: u64,
    ) {
        self.range.set_start(start);
    }

    pub fn set_end(
        &mut self,
        end: u64,
    ) {
        self.range.set_end(end);
    }

    pub fn set_range(
        &mut self,
        range: Range,
    ) {
        self.range = range;
    }

    pub fn set_strand(
        &mut self,
        strand: Strand,
    ) {
        self.strand = strand;
    }

    /// Checks if this contig is fully contained within another contig.
    pub fn is_in(
        &self,
        other: &Self,
    ) -> bool {
        self.seqname == other.seqname && other.range.contains(&self.range)
    }

    /// Renders the contig in `Target` attribute form:
    /// `name start end [strand]`. The strand is omitted when it is `.`.
    pub fn to_target_string(&self) -> String {
        match self.strand {
            Strand::None => {
                format!("{} {} {}", self.seqname, self.start(), self.end())
            },
            strand => {
                format!(
                    "{} {} {} {}",
                    self.seqname,
                    self.start(),
                    self.end(),
                    strand
                )
            },
        }
    }
}

impl Display for Contig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{} ({})",
            self.seqname,
            self.start(),
            self.end(),
            self.strand
        )
    }
}
