//! Classifies GFF3 input lines.
//!
//! The tokenizer is a single forward pass over a [`BufRead`]. Each line
//! becomes a [`Token`]; the first malformed line yields an error and ends the
//! stream.

use std::io::BufRead;

use crate::data_structs::annotation::{
    FeatureRecord,
    SequenceRegion,
};
use crate::error::{
    Diagnostic,
    DiagnosticKind,
};

pub const GFF_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    GffVersion(u32),
    SequenceRegion(SequenceRegion),
    Fasta,
    /// `###`: everything before it is complete.
    Terminator,
    /// Any other `##` line, kept verbatim without the leading `#`.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GffLine {
    Blank,
    /// A `#` line, without the leading `#`.
    Comment(String),
    Directive(Directive),
    Feature(FeatureRecord),
    /// A `>` line, without the `>`.
    SequenceHeader(String),
    SequenceData(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub line: usize,
    pub kind: GffLine,
}

pub struct Tokenizer<R: BufRead> {
    reader: R,
    buf:    String,
    line:   usize,
    fasta:  bool,
    done:   bool,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line: 0,
            fasta: false,
            done: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize { self.line }

    /// True once a `##FASTA` directive or a `>` line has been seen.
    pub fn in_fasta(&self) -> bool { self.fasta }

    fn classify(
        &mut self,
        text: &str,
    ) -> Result<GffLine, Diagnostic> {
        let line = self.line;
        if text.trim().is_empty() {
            return Ok(GffLine::Blank);
        }
        if let Some(description) = text.strip_prefix('>') {
            self.fasta = true;
            return Ok(GffLine::SequenceHeader(description.trim().to_owned()));
        }
        if self.fasta {
            return Ok(GffLine::SequenceData(text.trim().to_owned()));
        }
        if text.trim_end() == "###" {
            return Ok(GffLine::Directive(Directive::Terminator));
        }
        if let Some(directive) = text.strip_prefix("##") {
            let directive = parse_directive(directive, line)?;
            if directive == Directive::Fasta {
                self.fasta = true;
            }
            return Ok(GffLine::Directive(directive));
        }
        if let Some(comment) = text.strip_prefix('#') {
            return Ok(GffLine::Comment(comment.to_owned()));
        }
        FeatureRecord::parse_line(text, Some(line)).map(GffLine::Feature)
    }
}

fn parse_directive(
    text: &str,
    line: usize,
) -> Result<Directive, Diagnostic> {
    let mut words = text.split_whitespace();
    match words.next() {
        Some("gff-version") => {
            let version = words.next().unwrap_or("");
            // "3.1.26" is accepted as version 3
            let major = version.split('.').next().unwrap_or("");
            let version = major.parse::<u32>().map_err(|_| {
                Diagnostic::syntax(
                    line,
                    format!("could not parse version \"{}\" on line {}", version, line),
                )
            })?;
            if version != GFF_VERSION {
                return Err(Diagnostic::syntax(
                    line,
                    format!(
                        "GFF version {} on line {} does not equal required version {}",
                        version, line, GFF_VERSION
                    ),
                ));
            }
            Ok(Directive::GffVersion(version))
        },
        Some("sequence-region") => {
            let args: Vec<&str> = words.collect();
            if args.len() != 3 {
                return Err(Diagnostic::syntax(
                    line,
                    format!(
                        "##sequence-region on line {} must have 3 arguments, found {}",
                        line,
                        args.len()
                    ),
                ));
            }
            let parse_bound = |value: &str, what: &str| -> Result<u64, Diagnostic> {
                let bound = value.parse::<i64>().map_err(|_| {
                    Diagnostic::syntax(
                        line,
                        format!("could not parse integer '{}' on line {}", value, line),
                    )
                })?;
                if bound < 0 {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Range,
                        Some(line),
                        format!("{} '{}' is negative on line {}", what, bound, line),
                    ));
                }
                Ok(bound as u64)
            };
            let start = parse_bound(args[1], "start")?;
            let end = parse_bound(args[2], "end")?;
            Ok(Directive::SequenceRegion(
                SequenceRegion::new(args[0], start, end).with_line(Some(line)),
            ))
        },
        Some("FASTA") => Ok(Directive::Fasta),
        _ => Ok(Directive::Other(format!("#{}", text))),
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = Result<Token, Diagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_line(&mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            },
            Ok(_) => {
                self.line += 1;
                let text = std::mem::take(&mut self.buf);
                let result = self
                    .classify(text.trim_end_matches(['\n', '\r']))
                    .map(|kind| {
                        Token {
                            line: self.line,
                            kind,
                        }
                    });
                self.buf = text;
                if result.is_err() {
                    self.done = true;
                }
                Some(result)
            },
            Err(e) => {
                self.done = true;
                Some(Err(Diagnostic::syntax(
                    self.line + 1,
                    format!("could not read line {}: {}", self.line + 1, e),
                )))
            },
        }
    }
}
