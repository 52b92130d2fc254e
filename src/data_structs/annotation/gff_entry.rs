use std::fmt::{
    self,
    Write,
};
use std::str::FromStr;

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::de::{
    self,
    Deserializer,
    Visitor,
};
use serde::Serialize;

use crate::data_structs::coords::{
    Contig,
    Range,
};
use crate::data_structs::enums::Strand;
use crate::error::{
    on_line,
    Diagnostic,
    DiagnosticKind,
};
use crate::utils::{
    escape,
    unescape,
};
use crate::with_field_fn;

pub const ID_TAG: &str = "ID";
pub const PARENT_TAG: &str = "Parent";
pub const TARGET_TAG: &str = "Target";

/// Column 9 of a feature line: tags mapped to their comma separated values,
/// in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GffAttributes(IndexMap<String, Vec<String>>);

impl GffAttributes {
    pub fn new() -> Self { Self::default() }

    /// Parses column 9. Tags and values are percent-unescaped; empty tags
    /// and values are kept so that [`GffAttributes::check`] can report them.
    pub fn parse(
        s: &str,
        line: Option<usize>,
    ) -> Result<Self, Diagnostic> {
        let mut attributes = GffAttributes::default();
        if s == "." {
            return Ok(attributes);
        }

        let mut tokens: Vec<&str> = s.split(';').collect();
        if tokens.len() > 1 && tokens.last() == Some(&"") {
            tokens.pop();
        }
        if tokens.len() > 1 && tokens.contains(&".") {
            return Err(Diagnostic::new(
                DiagnosticKind::Attribute,
                line,
                format!("more than one attribute token defined{}", on_line(line)),
            ));
        }

        for token in tokens {
            if token.is_empty() {
                return Err(Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!("empty attribute{} has no tag", on_line(line)),
                ));
            }
            if token.matches('=').count() != 1 {
                return Err(Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!(
                        "token \"{}\"{} does not contain exactly one '='",
                        token,
                        on_line(line)
                    ),
                ));
            }
            let (tag, value) = token.split_once('=').unwrap_or((token, ""));
            let unescape_at = |text: &str| {
                unescape(text).map_err(|fragment| {
                    Diagnostic::new(
                        DiagnosticKind::Syntax,
                        line,
                        format!(
                            "illegal percent escape \"{}\" in attribute \"{}\"{}",
                            fragment,
                            token,
                            on_line(line)
                        ),
                    )
                })
            };
            let tag = unescape_at(tag)?;
            let values = value
                .split(',')
                .map(unescape_at)
                .collect::<Result<Vec<_>, _>>()?;

            if attributes.0.contains_key(&tag) {
                return Err(Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!(
                        "the attribute \"{}\"{} is defined more than once",
                        tag,
                        on_line(line)
                    ),
                ));
            }
            attributes.0.insert(tag, values);
        }
        Ok(attributes)
    }

    pub fn get(
        &self,
        tag: &str,
    ) -> Option<&[String]> {
        self.0.get(tag).map(Vec::as_slice)
    }

    /// First value of `tag`.
    pub fn first(
        &self,
        tag: &str,
    ) -> Option<&str> {
        self.0
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> { self.first(ID_TAG) }

    /// Values of the `Parent` tag, empty when there is none.
    pub fn parents(&self) -> &[String] { self.get(PARENT_TAG).unwrap_or(&[]) }

    pub fn contains(
        &self,
        tag: &str,
    ) -> bool {
        self.0.contains_key(tag)
    }

    /// Sets `tag`, keeping its position if it is already present.
    pub fn insert<S: Into<String>>(
        &mut self,
        tag: S,
        values: Vec<String>,
    ) -> Option<Vec<String>> {
        self.0.insert(tag.into(), values)
    }

    pub fn with_attribute<S: Into<String>>(
        mut self,
        tag: S,
        values: Vec<String>,
    ) -> Self {
        self.insert(tag, values);
        self
    }

    /// Removes `tag`, preserving the order of the remaining attributes.
    pub fn remove(
        &mut self,
        tag: &str,
    ) -> Option<Vec<String>> {
        self.0.shift_remove(tag)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Vec<String>> { self.0.iter() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Attribute-level checks: empty tags and values, a multi-valued `ID`
    /// and the shape of `Target`.
    pub fn check(
        &self,
        line: Option<usize>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (tag, values) in self.0.iter() {
            if tag.is_empty() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!(
                        "the attribute with value \"{}\"{} has no tag",
                        values.join(","),
                        on_line(line)
                    ),
                ));
            }
            if values.is_empty() || values.iter().any(String::is_empty) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!("the attribute \"{}\"{} has no value", tag, on_line(line)),
                ));
                continue;
            }
            if tag == ID_TAG && values.len() > 1 {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!(
                        "the ID attribute{} has more than one value",
                        on_line(line)
                    ),
                ));
            }
            if tag == TARGET_TAG {
                diagnostics.extend(
                    values
                        .iter()
                        .filter_map(|value| parse_target(value, line).err()),
                );
            }
        }
        diagnostics
    }
}

impl fmt::Display for GffAttributes {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_char('.');
        }
        for (i, (tag, values)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(';')?;
            }
            write!(f, "{}=", escape(tag))?;
            for (j, value) in values.iter().enumerate() {
                if j > 0 {
                    f.write_char(',')?;
                }
                f.write_str(&escape(value))?;
            }
        }
        Ok(())
    }
}

impl FromStr for GffAttributes {
    type Err = Diagnostic;

    fn from_str(s: &str) -> Result<Self, Self::Err> { GffAttributes::parse(s, None) }
}

impl Serialize for GffAttributes {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer, {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for GffAttributes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>, {
        struct GffAttributesVisitor;

        impl Visitor<'_> for GffAttributesVisitor {
            type Value = GffAttributes;

            fn expecting(
                &self,
                formatter: &mut fmt::Formatter,
            ) -> fmt::Result {
                formatter.write_str("a string of GFF3 attributes")
            }

            fn visit_str<E>(
                self,
                value: &str,
            ) -> Result<GffAttributes, E>
            where
                E: de::Error, {
                GffAttributes::from_str(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(GffAttributesVisitor)
    }
}

impl<'a> IntoIterator for &'a GffAttributes {
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;
    type Item = (&'a String, &'a Vec<String>);

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

/// Parses one value of the `Target` attribute: `target_id start end
/// [strand]`.
pub fn parse_target(
    value: &str,
    line: Option<usize>,
) -> Result<Contig, Diagnostic> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(Diagnostic::new(
            DiagnosticKind::Attribute,
            line,
            format!(
                "Target attribute value \"{}\"{} must have 3 or 4 blank separated \
                 entries",
                value,
                on_line(line)
            ),
        ));
    }
    let parse_pos = |field: &str| {
        field.parse::<u64>().map_err(|_| {
            Diagnostic::new(
                DiagnosticKind::Syntax,
                line,
                format!(
                    "could not parse integer '{}' in Target attribute{}",
                    field,
                    on_line(line)
                ),
            )
        })
    };
    let start = parse_pos(fields[1])?;
    let end = parse_pos(fields[2])?;
    if start > end {
        return Err(Diagnostic::new(
            DiagnosticKind::Range,
            line,
            format!(
                "start '{}' is larger then end '{}'{}",
                start,
                end,
                on_line(line)
            ),
        ));
    }
    let strand = match fields.get(3) {
        Some(symbol) => {
            Strand::from_str(symbol).map_err(|e| {
                Diagnostic::new(
                    DiagnosticKind::Attribute,
                    line,
                    format!("{} in Target attribute{}", e, on_line(line)),
                )
            })?
        },
        None => Strand::None,
    };
    Ok(Contig::new(fields[0], start, end, strand))
}

/// One GFF3 feature line.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub contig:       Contig,
    pub source:       ArcStr,
    pub feature_type: ArcStr,
    pub score:        Option<f64>,
    pub phase:        Option<u8>,
    pub attributes:   GffAttributes,
    pub line:         Option<usize>,
}

impl FeatureRecord {
    pub fn new<S: Into<ArcStr>>(
        contig: Contig,
        feature_type: S,
    ) -> Self {
        Self {
            contig,
            source: arcstr::literal!("."),
            feature_type: feature_type.into(),
            score: None,
            phase: None,
            attributes: GffAttributes::default(),
            line: None,
        }
    }

    with_field_fn!(source, ArcStr);

    with_field_fn!(score, Option<f64>);

    with_field_fn!(phase, Option<u8>);

    with_field_fn!(attributes, GffAttributes);

    with_field_fn!(line, Option<usize>);

    /// Parses the nine tab separated columns of a feature line.
    ///
    /// Only malformed columns are rejected here. Semantic checks (positive
    /// start, ordered bounds, attribute values) are done by
    /// [`FeatureRecord::check`].
    pub fn parse_line(
        text: &str,
        line: Option<usize>,
    ) -> Result<Self, Diagnostic> {
        let columns: Vec<&str> = text.split('\t').collect();
        if columns.len() != 9 {
            return Err(Diagnostic::new(
                DiagnosticKind::Syntax,
                line,
                format!(
                    "line{} contains {} tab separated fields instead of 9",
                    line.map(|l| format!(" {}", l)).unwrap_or_default(),
                    columns.len()
                ),
            ));
        }
        let syntax = |message: String| Diagnostic::new(DiagnosticKind::Syntax, line, message);

        let parse_pos = |field: &str, what: &str| -> Result<u64, Diagnostic> {
            match field.parse::<i64>() {
                Ok(pos) if pos < 0 => {
                    Err(Diagnostic::new(
                        DiagnosticKind::Range,
                        line,
                        format!("illegal feature {} {}{}", what, pos, on_line(line)),
                    ))
                },
                Ok(pos) => Ok(pos as u64),
                Err(_) => {
                    Err(syntax(format!(
                        "could not parse integer '{}' for feature {}{}",
                        field,
                        what,
                        on_line(line)
                    )))
                },
            }
        };
        let start = parse_pos(columns[3], "start")?;
        let end = parse_pos(columns[4], "end")?;

        let score = match columns[5] {
            "." => None,
            score => {
                Some(score.parse::<f64>().map_err(|_| {
                    syntax(format!(
                        "could not parse score '{}'{}",
                        score,
                        on_line(line)
                    ))
                })?)
            },
        };
        let strand = Strand::from_str(columns[6])
            .map_err(|e| syntax(format!("{}{}", e, on_line(line))))?;
        let phase = match columns[7] {
            "." => None,
            "0" => Some(0),
            "1" => Some(1),
            "2" => Some(2),
            phase => {
                return Err(syntax(format!(
                    "could not parse phase '{}'{} (must be one of '.012')",
                    phase,
                    on_line(line)
                )))
            },
        };
        let attributes = GffAttributes::parse(columns[8], line)?;

        Ok(Self {
            contig: Contig::new(columns[0], start, end, strand),
            source: ArcStr::from(columns[1]),
            feature_type: ArcStr::from(columns[2]),
            score,
            phase,
            attributes,
            line,
        })
    }

    pub fn seqid(&self) -> &ArcStr { self.contig.seqname() }

    pub fn start(&self) -> u64 { self.contig.start() }

    pub fn end(&self) -> u64 { self.contig.end() }

    pub fn range(&self) -> Range { self.contig.range() }

    pub fn strand(&self) -> Strand { self.contig.strand() }

    pub fn id(&self) -> Option<&str> { self.attributes.id() }

    pub fn parents(&self) -> &[String] { self.attributes.parents() }

    /// Record-level checks, run while parsing and again by the validator.
    pub fn check(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.start() < 1 {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Range,
                self.line,
                format!(
                    "illegal feature start {}{} (must be positive)",
                    self.start(),
                    on_line(self.line)
                ),
            ));
        }
        if self.start() > self.end() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Range,
                self.line,
                format!(
                    "start '{}' is larger then end '{}'{}",
                    self.start(),
                    self.end(),
                    on_line(self.line)
                ),
            ));
        }
        if matches!(self.phase, Some(phase) if phase > 2) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Syntax,
                self.line,
                format!("illegal phase{} (must be one of '.012')", on_line(self.line)),
            ));
        }
        diagnostics.extend(self.attributes.check(self.line));
        diagnostics
    }

    /// Compares everything except the source line.
    pub fn same_content(
        &self,
        other: &Self,
    ) -> bool {
        self.contig == other.contig
            && self.source == other.source
            && self.feature_type == other.feature_type
            && self.score == other.score
            && self.phase == other.phase
            && self.attributes == other.attributes
    }

    /// The first eight columns, tab separated.
    pub(crate) fn columns(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.seqid(),
            self.source,
            self.feature_type,
            self.start(),
            self.end(),
            self.score
                .map(|s| s.to_string())
                .unwrap_or_else(|| ".".to_owned()),
            self.strand(),
            self.phase
                .map(|p| p.to_string())
                .unwrap_or_else(|| ".".to_owned()),
        )
    }
}

impl FromStr for FeatureRecord {
    type Err = Diagnostic;

    fn from_str(s: &str) -> Result<Self, Self::Err> { FeatureRecord::parse_line(s, None) }
}

impl fmt::Display for FeatureRecord {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}\t{}", self.columns(), self.attributes)
    }
}
