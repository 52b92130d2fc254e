//! Reader for the OBO flat file format.
//!
//! A header block of `tag: value` lines comes first and must carry a
//! `format-version` tag. It is followed by `[Kind]` stanzas. `!` starts a
//! comment, blank lines are ignored and `\r\n` line endings are accepted.

use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
};
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use log::debug;

use crate::data_structs::ontology::{
    Ontology,
    Stanza,
    StanzaKind,
};
use crate::error::{
    Diagnostic,
    DiagnosticKind,
};

const FORMAT_VERSION_TAG: &str = "format-version";

enum ParseState {
    Header,
    Stanza(Stanza),
}

struct OboParser {
    header:      IndexMap<String, Vec<String>>,
    header_line: Option<usize>,
    stanzas:     Vec<Stanza>,
    state:       ParseState,
    line:        usize,
}

impl OboParser {
    fn new() -> Self {
        Self {
            header:      IndexMap::new(),
            header_line: None,
            stanzas:     Vec::new(),
            state:       ParseState::Header,
            line:        0,
        }
    }

    fn error<S: Into<String>>(
        &self,
        message: S,
    ) -> Diagnostic {
        Diagnostic::ontology(self.line, message)
    }

    /// Handles one physical line. `has_newline` is false only for a last line
    /// cut by the end of input.
    fn feed(
        &mut self,
        raw: &str,
        has_newline: bool,
    ) -> Result<(), Diagnostic> {
        self.line += 1;
        let content = strip_comment(raw.trim_end_matches(['\n', '\r'])).trim();
        if content.is_empty() {
            return Ok(());
        }

        if content.starts_with('[') {
            let name = content
                .strip_prefix('[')
                .and_then(|c| c.strip_suffix(']'))
                .ok_or_else(|| {
                    self.error(format!("expected character ']' on line {}", self.line))
                })?;
            return self.begin_stanza(name.trim());
        }

        let (tag, value) = self.split_tag(content, has_newline)?;
        match &mut self.state {
            ParseState::Header => {
                self.header_line.get_or_insert(self.line);
                self.header
                    .entry(tag)
                    .or_default()
                    .push(value);
            },
            ParseState::Stanza(stanza) => stanza.push_tag(tag, value),
        }
        Ok(())
    }

    fn split_tag(
        &self,
        content: &str,
        has_newline: bool,
    ) -> Result<(String, String), Diagnostic> {
        let Some((tag, value)) = content.split_once(':')
        else {
            return Err(if has_newline {
                self.error(format!("expected character ':' on line {}", self.line))
            }
            else {
                self.error(format!("unexpected end-of-file on line {}", self.line))
            });
        };
        let (tag, value) = (tag.trim(), value.trim());
        if tag.is_empty() {
            return Err(self.error(format!("expected tag before ':' on line {}", self.line)));
        }
        if value.is_empty() {
            return Err(if has_newline {
                self.error(format!("unexpected newline on line {}", self.line))
            }
            else {
                self.error(format!("unexpected end-of-file on line {}", self.line))
            });
        }
        Ok((tag.to_owned(), value.to_owned()))
    }

    fn check_header(&self) -> Result<(), Diagnostic> {
        if self.header.contains_key(FORMAT_VERSION_TAG) {
            return Ok(());
        }
        Err(Diagnostic::ontology(
            self.header_line.unwrap_or(self.line),
            format!(
                "the header starting on line {} does not contain \"{}\" tag",
                self.header_line.unwrap_or(self.line),
                FORMAT_VERSION_TAG
            ),
        ))
    }

    fn begin_stanza(
        &mut self,
        name: &str,
    ) -> Result<(), Diagnostic> {
        let next = ParseState::Stanza(Stanza::new(StanzaKind::from_name(name), self.line));
        match std::mem::replace(&mut self.state, next) {
            ParseState::Header => self.check_header(),
            ParseState::Stanza(previous) => self.finish_stanza(previous),
        }
    }

    fn finish_stanza(
        &mut self,
        stanza: Stanza,
    ) -> Result<(), Diagnostic> {
        if let Some(required) = stanza.kind().required_tag() {
            if !stanza.contains(required) {
                return Err(Diagnostic::ontology(
                    stanza.line(),
                    format!(
                        "{} stanza starting on line {} lacks required \"{}\" tag",
                        stanza.kind(),
                        stanza.line(),
                        required
                    ),
                ));
            }
        }
        self.stanzas.push(stanza);
        Ok(())
    }

    fn finish(mut self) -> Result<Ontology, Diagnostic> {
        match std::mem::replace(&mut self.state, ParseState::Header) {
            ParseState::Header => {
                if self.header.is_empty() {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Ontology,
                        Some(self.line.max(1)),
                        "unexpected end-of-file while reading the ontology header",
                    ));
                }
                self.check_header()?;
            },
            ParseState::Stanza(last) => self.finish_stanza(last)?,
        }
        debug!(
            "Parsed ontology with {} header tags and {} stanzas",
            self.header.len(),
            self.stanzas.len()
        );
        Ok(Ontology::new(self.header, self.stanzas))
    }
}

/// Cuts a trailing `!` comment. `\!` is an escaped exclamation mark.
fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '!' if !escaped => return &line[..i],
            _ => escaped = false,
        }
    }
    line
}

/// Reads an ontology from any buffered reader.
pub fn read_obo<R: BufRead>(mut reader: R) -> Result<Ontology, Diagnostic> {
    let mut parser = OboParser::new();
    let mut buf = String::new();
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf).map_err(|e| {
            Diagnostic::syntax(
                parser.line + 1,
                format!("could not read line {}: {}", parser.line + 1, e),
            )
        })?;
        if n == 0 {
            break;
        }
        parser.feed(&buf, buf.ends_with('\n'))?;
    }
    parser.finish()
}

/// Parses ontology text held in memory.
pub fn parse_obo(text: &str) -> Result<Ontology, Diagnostic> { read_obo(text.as_bytes()) }

/// Reads an ontology file.
pub fn read_obo_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Ontology> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open ontology file {}", path.display()))?;
    let ontology = read_obo(BufReader::new(file))
        .with_context(|| format!("Failed to parse ontology file {}", path.display()))?;
    debug!(
        "Loaded {} terms from {}",
        ontology.len(),
        path.display()
    );
    Ok(ontology)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const MINIMAL: &str = "format-version: 1.2\n";

    #[test]
    fn test_minimal_ontology_has_no_terms() {
        let ontology = parse_obo(MINIMAL).unwrap();
        assert_eq!(ontology.format_version(), Some("1.2"));
        assert!(ontology.is_empty());
        assert!(!ontology.is_valid_type("gene"));
    }

    #[rstest]
    #[case("format-version: 1.2\n\n")]
    #[case("format-version: 1.2\n! comment\n")]
    #[case("format-version: 1.2\n\n! comment\n")]
    #[case("format-version: 1.2 ! trailing comment\r\n")]
    #[case("format-version: 1.2")]
    fn test_header_terminators(#[case] text: &str) {
        let ontology = parse_obo(text).unwrap();
        assert_eq!(ontology.format_version(), Some("1.2"));
    }

    #[rstest]
    #[case("", "unexpected end-of-file")]
    #[case("\n\n", "unexpected end-of-file")]
    #[case("! only a comment\n", "unexpected end-of-file")]
    #[case("format-version", "unexpected end-of-file")]
    #[case("format-version:", "unexpected end-of-file")]
    #[case("format-version\n", "expected character ':'")]
    #[case("format-version:\n", "unexpected newline")]
    #[case("date: 01:01:2008\n", "does not contain \"format-version\" tag")]
    #[case(
        "date: 01:01:2008\n\n[Term]\nid: SO:1\nname: a\n",
        "does not contain \"format-version\" tag"
    )]
    #[case("format-version: 1.2\n\n[Term]\nid: SO:1\n", "lacks required \"name\" tag")]
    #[case("format-version: 1.2\n\n[Typedef]\nid: part_of\n", "lacks required \"name\" tag")]
    #[case(
        "format-version: 1.2\n\n[Instance]\nid: x\nname: x\n",
        "lacks required \"instance_of\" tag"
    )]
    #[case("format-version: 1.2\n\n[Term\n", "expected character ']'")]
    fn test_malformed_ontologies(
        #[case] text: &str,
        #[case] message: &str,
    ) {
        let err = parse_obo(text).unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::Ontology);
        assert!(err.message().contains(message), "{}", err);
    }

    #[test]
    fn test_stanzas_and_comments() {
        let text = "format-version: 1.2\r\n\
                    ontology: test\r\n\
                    \r\n\
                    [Term]\r\n\
                    id: SO:0000704\r\n\
                    ! a comment inside a stanza\r\n\
                    name: gene ! trailing\r\n\
                    \r\n\
                    [Term]\r\n\
                    id: SO:0000147\r\n\
                    name: exon\r\n\
                    is_a: SO:0000704 ! gene\r\n\
                    \r\n\
                    [Instance]\r\n\
                    id: ex1\r\n\
                    instance_of: SO:0000147\r\n\
                    \r\n\
                    [Annotation]\r\n\
                    id: misc\r\n";
        let ontology = parse_obo(text).unwrap();
        assert_eq!(ontology.stanzas().len(), 4);
        assert_eq!(ontology.len(), 2);
        assert_eq!(ontology.header_value("ontology"), Some("test"));
        assert_eq!(ontology.term("gene").unwrap().id(), "SO:0000704");
        assert_eq!(ontology.term("exon").unwrap().is_a(), ["SO:0000704"]);
        assert_eq!(
            ontology.stanzas()[3].kind(),
            &StanzaKind::Other("Annotation".to_owned())
        );
    }

    #[test]
    fn test_read_obo_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("types.obo");
        std::fs::write(&path, "format-version: 1.2\n\n[Term]\nid: T:1\nname: thing\n")?;
        let ontology = read_obo_file(&path)?;
        assert!(ontology.is_valid_type("thing"));

        let err = read_obo_file(dir.path().join("missing.obo")).unwrap_err();
        assert!(err.to_string().contains("Failed to open ontology file"));
        Ok(())
    }
}
