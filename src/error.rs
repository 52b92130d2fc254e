//! Diagnostics reported by the parser, the validator and the transforms.
//!
//! Every failure carries a [`DiagnosticKind`] which decides whether it can be
//! relaxed (only [`DiagnosticKind::Reference`] in tidy mode), the 1-based line
//! it originates from (when there is one) and a human readable message.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Malformed tokens: column count, bad escapes, unparsable numbers.
    Syntax,
    /// Undefined parents, IDs separated by a terminator, cycles.
    Reference,
    /// Coordinates outside regions, negative or swapped ranges, underflow.
    Range,
    /// Malformed ontology stanzas and unknown feature types.
    Ontology,
    /// Empty tags or values, malformed `Target` attributes.
    Attribute,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", match self {
            DiagnosticKind::Syntax => "syntax error",
            DiagnosticKind::Reference => "reference error",
            DiagnosticKind::Range => "range error",
            DiagnosticKind::Ontology => "ontology error",
            DiagnosticKind::Attribute => "attribute error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct Diagnostic {
    kind:    DiagnosticKind,
    line:    Option<usize>,
    message: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(
        kind: DiagnosticKind,
        line: Option<usize>,
        message: S,
    ) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn syntax<S: Into<String>>(
        line: usize,
        message: S,
    ) -> Self {
        Self::new(DiagnosticKind::Syntax, Some(line), message)
    }

    pub fn reference<S: Into<String>>(
        line: usize,
        message: S,
    ) -> Self {
        Self::new(DiagnosticKind::Reference, Some(line), message)
    }

    pub fn range<S: Into<String>>(
        line: usize,
        message: S,
    ) -> Self {
        Self::new(DiagnosticKind::Range, Some(line), message)
    }

    pub fn ontology<S: Into<String>>(
        line: usize,
        message: S,
    ) -> Self {
        Self::new(DiagnosticKind::Ontology, Some(line), message)
    }

    pub fn attribute<S: Into<String>>(
        line: usize,
        message: S,
    ) -> Self {
        Self::new(DiagnosticKind::Attribute, Some(line), message)
    }

    pub fn kind(&self) -> DiagnosticKind { self.kind }

    /// Line the diagnostic refers to. `None` for documents or records that
    /// were not read from text.
    pub fn line(&self) -> Option<usize> { self.line }

    pub fn message(&self) -> &str { &self.message }

    /// Reference errors are the only ones tidy mode may downgrade.
    pub fn is_fatal(
        &self,
        tidy: bool,
    ) -> bool {
        !(tidy && self.kind == DiagnosticKind::Reference)
    }
}

/// `" on line N"`, or nothing for records that were not read from text.
pub(crate) fn on_line(line: Option<usize>) -> String {
    match line {
        Some(line) => format!(" on line {}", line),
        None => String::new(),
    }
}

/// A non-empty collection of diagnostics, returned by whole-document checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticList(Vec<Diagnostic>);

impl DiagnosticList {
    /// Returns `Ok(())` for an empty list.
    pub fn check(diagnostics: Vec<Diagnostic>) -> Result<(), DiagnosticList> {
        if diagnostics.is_empty() {
            Ok(())
        }
        else {
            Err(DiagnosticList(diagnostics))
        }
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> { self.0.iter() }

    pub fn first(&self) -> Option<&Diagnostic> { self.0.first() }

    pub fn contains_kind(
        &self,
        kind: DiagnosticKind,
    ) -> bool {
        self.0.iter().any(|d| d.kind == kind)
    }

    pub fn into_inner(self) -> Vec<Diagnostic> { self.0 }
}

impl fmt::Display for DiagnosticList {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticList {}

impl From<Diagnostic> for DiagnosticList {
    fn from(value: Diagnostic) -> Self { DiagnosticList(vec![value]) }
}

impl IntoIterator for DiagnosticList {
    type IntoIter = std::vec::IntoIter<Diagnostic>;
    type Item = Diagnostic;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type IntoIter = std::slice::Iter<'a, Diagnostic>;
    type Item = &'a Diagnostic;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tidy_relaxes_only_reference_errors() {
        let reference = Diagnostic::reference(3, "undefined parent");
        let range = Diagnostic::range(3, "out of range");
        assert!(reference.is_fatal(false));
        assert!(!reference.is_fatal(true));
        assert!(range.is_fatal(true));
    }

    #[test]
    fn test_list_display_joins_messages() {
        let list = DiagnosticList::check(vec![
            Diagnostic::syntax(1, "first"),
            Diagnostic::attribute(2, "second"),
        ])
        .unwrap_err();
        assert_eq!(list.to_string(), "first\nsecond");
        assert!(list.contains_kind(DiagnosticKind::Attribute));
        assert!(DiagnosticList::check(vec![]).is_ok());
    }
}
