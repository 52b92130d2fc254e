//! Shifts coordinates by a uniform or per-sequence offset.

use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
};
use std::path::Path;

use anyhow::Context;
use hashbrown::HashMap;
use log::debug;

use crate::data_structs::annotation::Document;
use crate::error::{
    on_line,
    Diagnostic,
    DiagnosticKind,
};

/// Sequence regions may start at 0, features at 1.
const REGION_FLOOR: u64 = 0;
const FEATURE_FLOOR: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetSpec {
    /// The same offset for every sequence.
    Uniform(i64),
    /// One offset per seqid. A seqid without entry is an error.
    PerSeqid(HashMap<String, i64>),
}

impl OffsetSpec {
    /// Reads `seqid offset` pairs, one per line. Blank lines and `#` lines
    /// are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Diagnostic> {
        let mut offsets = HashMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(|e| {
                Diagnostic::syntax(line_no, format!("could not read line {}: {}", line_no, e))
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [seqid, offset] = fields.as_slice()
            else {
                return Err(Diagnostic::syntax(
                    line_no,
                    format!(
                        "line {} of the offset file must contain a seqid and an offset",
                        line_no
                    ),
                ));
            };
            let offset = offset.parse::<i64>().map_err(|_| {
                Diagnostic::syntax(
                    line_no,
                    format!("could not parse offset '{}' on line {}", offset, line_no),
                )
            })?;
            offsets.insert((*seqid).to_owned(), offset);
        }
        if offsets.is_empty() {
            return Err(Diagnostic::new(
                DiagnosticKind::Syntax,
                None,
                "the offset file contains no offset",
            ));
        }
        Ok(OffsetSpec::PerSeqid(offsets))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open offset file {}", path.display()))?;
        OffsetSpec::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse offset file {}", path.display()))
    }

    pub fn offset_for(
        &self,
        seqid: &str,
    ) -> Option<i64> {
        match self {
            OffsetSpec::Uniform(offset) => Some(*offset),
            OffsetSpec::PerSeqid(offsets) => offsets.get(seqid).copied(),
        }
    }

    fn require(
        &self,
        seqid: &str,
        line: Option<usize>,
    ) -> Result<i64, Diagnostic> {
        self.offset_for(seqid).ok_or_else(|| {
            Diagnostic::new(
                DiagnosticKind::Reference,
                line,
                format!(
                    "no offset defined for seqid \"{}\"{}",
                    seqid,
                    on_line(line)
                ),
            )
        })
    }
}

impl From<i64> for OffsetSpec {
    fn from(value: i64) -> Self { OffsetSpec::Uniform(value) }
}

/// Shifts every feature and sequence region. A feature coordinate that
/// would drop below 1, or a region bound below 0, fails the whole
/// transformation. `Target` attributes are left untouched.
pub fn transform_offset(
    mut doc: Document,
    spec: &OffsetSpec,
) -> Result<Document, Diagnostic> {
    let underflow = |what: &str, line: Option<usize>, offset: i64, floor: u64| {
        Diagnostic::new(
            DiagnosticKind::Range,
            line,
            format!(
                "applying offset {} to the {}{} moves a coordinate below {}",
                offset,
                what,
                on_line(line),
                floor
            ),
        )
    };

    for region in doc.regions_mut() {
        let offset = spec.require(region.seqid(), region.line())?;
        let shifted = region
            .range()
            .shift(offset, REGION_FLOOR)
            .ok_or_else(|| underflow("sequence region", region.line(), offset, REGION_FLOOR))?;
        region.set_range(shifted);
    }

    let ids: Vec<_> = doc.nodes().map(|(id, _)| id).collect();
    for id in ids {
        for record in doc.node_mut(id).records_mut() {
            let offset = spec.require(record.seqid(), record.line)?;
            let shifted = record
                .range()
                .shift(offset, FEATURE_FLOOR)
                .ok_or_else(|| underflow("feature", record.line, offset, FEATURE_FLOOR))?;
            record.contig.set_range(shifted);
        }
    }
    debug!("Applied offsets to {} nodes", doc.node_count());
    Ok(doc)
}
